use std::io::{self, Write};
use std::process;

use keithley_pulse::{RunSummary, SweepError, SweepParams, SweepResult};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = SweepParams::default();
    log::info!(
        "Pulse sweep on {}: drain {} V, gate {} / {} V, {} cycles of {} s",
        params.address,
        params.drain_v,
        params.gate_high,
        params.gate_low,
        params.total_cycles,
        params.pulse_width
    );

    match measure(&params) {
        Ok(summary) => {
            log::info!(
                "{} samples in {:.2} s written to '{}'",
                summary.rows,
                summary.duration.as_secs_f64(),
                params.csv_path.display()
            );
            println!("Measurement complete. CSV saved.");
        }
        Err(e) => {
            let code = report_failure(&e, &mut io::stdout().lock());
            process::exit(code);
        }
    }
}

/// Print the diagnostic once to `out` and return the exit status.
fn report_failure<W: Write>(err: &SweepError, out: &mut W) -> i32 {
    // stdout may already be gone; the exit status still reports the failure
    let _ = writeln!(out, "{}", err);
    err.exit_code()
}

#[cfg(feature = "visa")]
fn measure(params: &SweepParams) -> SweepResult<RunSummary> {
    let backend = keithley_pulse::visa::VisaBackend::new();
    keithley_pulse::run(&backend, params, std::thread::sleep)
}

#[cfg(not(feature = "visa"))]
fn measure(_params: &SweepParams) -> SweepResult<RunSummary> {
    Err(SweepError::FeatureNotEnabled("visa".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reported_once() {
        let err = SweepError::BackendOpen("viOpenDefaultRM failed".to_string());
        let mut out = Vec::new();
        let code = report_failure(&err, &mut out);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(code, -1);
        assert_eq!(text.lines().count(), 1);
        assert_eq!(text.matches("viOpenDefaultRM failed").count(), 1);
    }
}
