//! Integration tests for spkboost-cli.
//!
//! Every test drives the built binary against the simulated `dummy` target.

use std::process::Command;

/// Helper to get the path to the `spkboost` binary built by cargo.
fn spkboost_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spkboost"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

// ---------------------------------------------------------------------------
// `spkboost record`
// ---------------------------------------------------------------------------

#[test]
fn cli_record_prints_header_and_lines() {
    let output = spkboost_bin()
        .args(["record", "--target", "dummy", "-n", "2", "-i", "0"])
        .output()
        .expect("failed to run spkboost record");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "got: {stdout}");
    assert_eq!(lines[0], "recording interval time: 0 ms");
    assert!(lines[1].starts_with("line,i2caddr,statusRegister"));
    assert!(lines[2].starts_with("1,0x34,0x805f,"));
    assert!(lines[3].starts_with("2,0x34,"));
}

#[test]
fn cli_record_two_devices_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("rec.csv");
    let status = spkboost_bin()
        .args(["record", "-t", "dummy", "-a", "0x34", "-a", "0x35", "-n", "1", "-i", "0"])
        .arg("--output")
        .arg(&csv)
        .status()
        .unwrap();
    assert!(status.success());

    let text = std::fs::read_to_string(&csv).unwrap();
    assert!(text.contains("\n1,0x34,"));
    assert!(text.contains("\n1,0x35,"));
}

#[test]
fn cli_rejects_hardware_target() {
    let output = spkboost_bin()
        .args(["record", "--target", "/dev/i2c-1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported transport"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// `spkboost log` and `spkboost modellog`
// ---------------------------------------------------------------------------

#[test]
fn cli_log_writes_all_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = spkboost_bin()
        .args(["log", "--target", "dummy", "-n", "3", "-i", "0", "-m", "1", "--quiet"])
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Logged 3 lines from 1 device(s), 3 model dumps"));

    for name in ["01L_0000.CSV", "01L_ZMDL.BIN", "01L_XMDL.BIN", "RUN.LOG"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
    assert_eq!(
        std::fs::metadata(dir.path().join("01L_ZMDL.BIN")).unwrap().len(),
        3 * 428
    );

    let listing = spkboost_bin()
        .arg("modellog")
        .arg(dir.path().join("01L_ZMDL.BIN"))
        .output()
        .unwrap();
    assert!(listing.status.success());
    let stdout = String::from_utf8_lossy(&listing.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("line,leakageFactor,"));
    assert!(lines[1].starts_with("1,0.00781"), "got: {}", lines[1]);
    assert!(lines[3].starts_with("3,"));
}

// ---------------------------------------------------------------------------
// `spkboost model`
// ---------------------------------------------------------------------------

#[test]
fn cli_model_show_prints_curve() {
    let output = spkboost_bin()
        .args(["model", "--target", "dummy", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("impedance model of device 0x34"));
    assert!(stdout.contains("Hz,impedance Ohm"));
    assert!(stdout.contains("\n62.5,"));
}

#[test]
fn cli_model_show_json() {
    let output = spkboost_bin()
        .args(["model", "-t", "dummy", "show", "--excursion", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\": \"excursion\""));
    assert!(stdout.contains("\"f_res\": 850"));
}

#[test]
fn cli_model_export_then_write() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("model.toml");
    let status = spkboost_bin()
        .args(["model", "--target", "dummy", "export", "--output"])
        .arg(&file)
        .status()
        .unwrap();
    assert!(status.success());

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("kind = \"impedance\""));
    std::fs::write(&file, text.replace("f_res = 850", "f_res = 912")).unwrap();

    let output = spkboost_bin()
        .args(["model", "--target", "dummy", "write", "--input"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("fRes 912 Hz"));
}

// ---------------------------------------------------------------------------
// `spkboost calibrate` and `spkboost config`
// ---------------------------------------------------------------------------

#[test]
fn cli_calibrate_set_reports_new_values() {
    let output = spkboost_bin()
        .args(["calibrate", "--target", "dummy", "set", "--vsense", "0.875", "--agc-gain-max=-3.5"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Vsense       0.875000"));
    assert!(stdout.contains("VisCal       1.000000"));
    assert!(stdout.contains("AGC gain max -3.50 dB"));
}

#[test]
fn cli_calibrate_set_needs_a_value() {
    let output = spkboost_bin()
        .args(["calibrate", "--target", "dummy", "set"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_config_init_then_use() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logger.toml");
    let status = spkboost_bin()
        .args(["config", "init", "--path"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());

    let again = spkboost_bin()
        .args(["config", "init", "--path"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!again.status.success(), "init must not overwrite without --force");

    let shown = spkboost_bin()
        .args(["config", "--config"])
        .arg(&path)
        .args(["--address", "0x35", "show"])
        .output()
        .unwrap();
    assert!(shown.status.success());
    let stdout = String::from_utf8_lossy(&shown.stdout);
    assert!(stdout.contains("target = \"dummy\""));
    assert!(stdout.contains("addresses"));
    assert!(stdout.contains("53"), "got: {stdout}");
}
