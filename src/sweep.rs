use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::SweepParams;
use crate::error::{SweepError, SweepResult};
use crate::keithley::{Channel, Keithley2600};
use crate::logger::ResponseLogger;
use crate::session::{Backend, Session};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub duration: Duration,
}

/// Toggle the gate between its high and low level for every cycle, polling
/// both currents `samples_per_phase` times per level.
///
/// The gate level is written once per phase. `pause` is called after every
/// sample with the sample interval.
pub fn run_pulse_sweep<S, W, F>(
    smu: &mut Keithley2600<S>,
    logger: &mut ResponseLogger<W>,
    params: &SweepParams,
    mut pause: F,
) -> SweepResult<()>
where
    S: Session,
    W: Write,
    F: FnMut(Duration),
{
    let npts = params.samples_per_phase();
    let interval = params.sample_interval();
    log::info!(
        "Starting pulse sweep: {} cycles, {} samples per level, dt {:?}",
        params.total_cycles,
        npts,
        interval
    );

    logger.start_clock();

    for cycle in 0..params.total_cycles {
        for gate_voltage in params.gate_levels() {
            smu.set_level(Channel::B, gate_voltage)?;
            log::debug!("Cycle {}: gate -> {:.3} V", cycle + 1, gate_voltage);

            for _ in 0..npts {
                let response = smu.measure_currents()?;
                logger.record(gate_voltage, &response)?;
                pause(interval);
            }
        }
        log::info!("Cycle {}/{} done", cycle + 1, params.total_cycles);
    }

    Ok(())
}

/// Switch both outputs off, then report anything left in the instrument
/// error queue. Only the output commands can fail the teardown.
pub fn teardown<S: Session>(smu: &mut Keithley2600<S>) -> SweepResult<()> {
    smu.outputs_off()?;
    log::info!("SMU outputs off");

    match smu.error_count() {
        Ok(0) => {}
        Ok(n) => log::warn!("Instrument reports {} queued error(s)", n),
        Err(e) => log::warn!("Could not read instrument error queue: {}", e),
    }
    Ok(())
}

/// Open the session and the CSV file, configure the SMU, run the sweep and
/// tear down.
///
/// Invalid timings and opening failures return before any command is sent. Once the SMU has been
/// configured, teardown runs whether or not the sweep succeeded.
pub fn run<B, F>(backend: &B, params: &SweepParams, pause: F) -> SweepResult<RunSummary>
where
    B: Backend,
    F: FnMut(Duration),
{
    params.validate()?;
    let session = backend.open(&params.address)?;
    let mut logger = ResponseLogger::create(&params.csv_path)?;
    let mut smu = Keithley2600::new(session);

    let started = Instant::now();
    let outcome = smu
        .configure(params)
        .map_err(SweepError::from)
        .and_then(|()| run_pulse_sweep(&mut smu, &mut logger, params, pause));

    if let Err(e) = &outcome {
        log::error!("Sweep aborted: {}", e);
    }
    let shutdown = teardown(&mut smu);
    let rows = logger.finish();

    outcome?;
    shutdown?;
    let rows = rows?;

    Ok(RunSummary {
        rows,
        duration: started.elapsed(),
    })
}
