use assert_cmd::Command;

const TEMPLATE: &str = "Value interface (\\S+)\nValue status (up|down)\n\nStart\n  ^${interface} \
                        is ${status} -> Record\n";

fn textfsm_cmd() -> Command {
	let mut cmd = Command::cargo_bin("textfsm").unwrap();
	cmd.env("NO_COLOR", "1");
	cmd
}

#[test]
fn parse_prints_text_records() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("interfaces.textfsm");
	let input_path = tmp.path().join("output.txt");
	std::fs::write(&template_path, TEMPLATE).unwrap();
	std::fs::write(&input_path, "eth0 is up\neth1 is down\n").unwrap();

	textfsm_cmd()
		.arg("parse")
		.arg("--template")
		.arg(&template_path)
		.arg(&input_path)
		.assert()
		.success()
		.stdout(predicates::str::contains("record 0"))
		.stdout(predicates::str::contains("interface = eth0"))
		.stdout(predicates::str::contains("interface = eth1"));
}

#[test]
fn parse_prints_json_records() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("interfaces.textfsm");
	let input_path = tmp.path().join("output.txt");
	std::fs::write(&template_path, TEMPLATE).unwrap();
	std::fs::write(&input_path, "eth0 is up\n").unwrap();

	textfsm_cmd()
		.arg("parse")
		.arg("--template")
		.arg(&template_path)
		.arg("--format")
		.arg("json")
		.arg(&input_path)
		.assert()
		.success()
		.stdout(predicates::str::contains(r#""interface": "eth0""#))
		.stdout(predicates::str::contains(r#""status": "up""#));
}

#[test]
fn parse_reads_stdin_when_no_input_file() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("interfaces.textfsm");
	std::fs::write(&template_path, TEMPLATE).unwrap();

	textfsm_cmd()
		.arg("parse")
		.arg("--template")
		.arg(&template_path)
		.write_stdin("eth0 is up\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("status    = up"));
}

#[test]
fn parse_reports_error_rules() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("strict.textfsm");
	std::fs::write(
		&template_path,
		"Value boo (\\d+)\n\nStart\n  ^$boo -> Record\n  ^.* -> Error \"unparsed line\"\n",
	)
	.unwrap();

	textfsm_cmd()
		.arg("parse")
		.arg("--template")
		.arg(&template_path)
		.write_stdin("not a number\n")
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("unparsed line"));
}

#[test]
fn check_accepts_valid_template() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("interfaces.textfsm");
	std::fs::write(&template_path, TEMPLATE).unwrap();

	textfsm_cmd()
		.arg("check")
		.arg("--template")
		.arg(&template_path)
		.assert()
		.success()
		.stdout(predicates::str::contains("template ok"));
}

#[test]
fn check_reports_template_defects() {
	let tmp = tempfile::tempdir().unwrap();
	let template_path = tmp.path().join("broken.textfsm");
	// Missing the blank line between values and states.
	std::fs::write(&template_path, "Value boo (.*)\nStart\n  ^$boo -> Record\n").unwrap();

	textfsm_cmd()
		.arg("check")
		.arg("--template")
		.arg(&template_path)
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("blank line"));
}
