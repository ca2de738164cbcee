use anyhow::{anyhow, Result as AnyhowResult};
use std::path::Path;
use std::process::Output;

pub fn run_idrs(args: &[&str]) -> AnyhowResult<Output> {
    let exe = Path::new(env!("CARGO_BIN_EXE_idrs"));
    assert!(exe.exists());

    let output = std::process::Command::new(exe)
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?
        .wait_with_output()?;
    Ok(output)
}

pub fn run_idrs_expect_success(args: &[&str]) -> AnyhowResult<Output> {
    let output = run_idrs(args)?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(anyhow!("failed to run idrs {:?}", args.join(" ")))
    }
}

/// Writes a minimal narrowPeak file: ten non-overlapping 100bp peaks on
/// chr1, signal values `1.0..10.0`, so two files built from different
/// `noise` closures give a realistic rank spread.
pub fn write_narrow_peak_file(
    path: &std::path::Path,
    signals: &[f64],
) -> AnyhowResult<()> {
    use std::io::Write;
    let mut f = std::fs::File::create(path)?;
    for (i, &signal) in signals.iter().enumerate() {
        let start = i * 1000;
        let stop = start + 100;
        writeln!(
            f,
            "chr1\t{start}\t{stop}\tpeak{i}\t0\t+\t{signal}\t-1\t-1\t50"
        )?;
    }
    Ok(())
}

pub fn read_lines(path: &std::path::Path) -> AnyhowResult<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().map(|l| l.to_string()).collect())
}
