// Bench harness: drive the simulated rig from the keyboard, no host needed.
// 1/2/3 = metal/plastic/paper, u = unsorted, p = paddle power, Q quit

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use sorter_serial_runtime::config::SorterConfig;
use sorter_serial_runtime::hal::SorterIo;
use sorter_serial_runtime::hal::sim::SimRig;
use sorter_serial_runtime::messages::TrashCategory;
use sorter_serial_runtime::runtime::Runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = SorterConfig::default();
    let mut runtime = Runtime::new(SimRig::new(), &config);

    info!("Controls: 1=metal, 2=plastic, 3=paper, u=unsorted, p=paddle power, Q=quit");

    enable_raw_mode()?;
    let result = run_bench(&mut runtime);
    disable_raw_mode()?;

    result
}

fn run_bench(runtime: &mut Runtime<SimRig>) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // The rig's clock is virtual; step it in time with the poll cadence
        // so the paddle phase advances
        runtime.driver_mut().io_mut().delay(Duration::from_millis(20));
        runtime.service_paddle();

        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Press && kind != KeyEventKind::Repeat {
                    continue;
                }

                let category = match code {
                    KeyCode::Char('1') => Some(TrashCategory::Metal),
                    KeyCode::Char('2') => Some(TrashCategory::Plastic),
                    KeyCode::Char('3') => Some(TrashCategory::Paper),
                    KeyCode::Char('u') => Some(TrashCategory::Unsorted),
                    KeyCode::Char('p') => {
                        let on = !runtime.paddle().power();
                        runtime.paddle_mut().set_power(on);
                        info!("Paddle power: {}", if on { "ON" } else { "OFF" });
                        None
                    }
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    _ => None,
                };

                if let Some(category) = category {
                    if runtime.on_command(category) {
                        let done = runtime.run_disposal();
                        runtime.acknowledge();
                        info!(
                            ?done,
                            paper_pending = runtime.sequencer().paper_pending(),
                            disk_deg = runtime.driver().io().disk_position_deg() as f64,
                            cross_deg = runtime.driver().io().cross_position_deg() as f64,
                            "sequence finished"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
