use std::{fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");

    let config_contents = String::new()
        + "[output]\n"
        + "n_networks = 2\n"
        + "format = \"graphml\"\n"
        + "\n"
        + "[niche]\n"
        + "n_species = 10\n"
        + "connectance = 0.2\n"
        + "seed = 1\n";

    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_foodwebs"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--out-dir", test_dir_str, "generate"]);
    for idx in 0..2 {
        assert!(test_dir.join(format!("web-{idx:04}.graphml")).exists());
        assert!(test_dir.join(format!("params-{idx:04}.msgpack")).exists());
    }

    // A second run continues the numbering instead of overwriting.
    run_bin(&["--out-dir", test_dir_str, "generate"]);
    assert!(test_dir.join("web-0003.graphml").exists());

    let levels_contents: String = (0..10).map(|id| format!("{id} {}\n", id % 3)).collect();
    let levels_path = test_dir.join("levels.txt");
    fs::write(&levels_path, levels_contents).expect("failed to write levels file");
    let levels_path_str = levels_path
        .to_str()
        .expect("failed to convert levels path to string");

    run_bin(&[
        "--out-dir",
        test_dir_str,
        "render",
        "--net-idx",
        "0",
        "--levels",
        levels_path_str,
    ]);
    assert!(test_dir.join("web-0000.dot").exists());

    run_bin(&["--out-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("web-0000.graphml").exists());
    assert!(!test_dir.join("web-0000.dot").exists());
    assert!(!test_dir.join("params-0000.msgpack").exists());

    fs::remove_dir_all(&test_dir).ok();
}
