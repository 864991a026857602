//! Put the SMU back into a known state: abort any running script, clear the
//! error queue, reset both channels and switch both outputs off.

use anyhow::Result;

use keithley_pulse::SweepParams;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = SweepParams::default();
    reset(&params.address)?;

    println!("SMU reset, outputs off.");
    Ok(())
}

#[cfg(feature = "visa")]
fn reset(address: &str) -> Result<()> {
    use anyhow::Context;
    use keithley_pulse::keithley::Keithley2600;
    use keithley_pulse::session::Backend;
    use keithley_pulse::visa::VisaBackend;

    let session = VisaBackend::new()
        .open(address)
        .with_context(|| format!("Failed to open SMU at {}", address))?;
    let mut smu = Keithley2600::new(session);
    smu.recover().context("Failed to reset SMU")?;

    match smu.error_count() {
        Ok(0) => log::info!("Error queue empty"),
        Ok(n) => log::warn!("{} error(s) still queued after reset", n),
        Err(e) => log::warn!("Could not read instrument error queue: {}", e),
    }
    Ok(())
}

#[cfg(not(feature = "visa"))]
fn reset(_address: &str) -> Result<()> {
    Err(keithley_pulse::SweepError::FeatureNotEnabled("visa".to_string()).into())
}
