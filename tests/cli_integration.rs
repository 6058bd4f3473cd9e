use assert_cmd::Command;
use hawala_delegation::eip7702::{authorization_signing_hash, Authorization};
use serde_json::Value;

const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
const KEY_ONE_ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("hawala-delegation"))
}

fn run_ok(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("cli runs");
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let response: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(response["success"], true);
    response["data"].clone()
}

fn run_err(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("cli runs");
    assert!(!output.status.success(), "cli should fail: {:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).unwrap_or(Value::Null)
}

#[test]
fn cli_digest_matches_library() {
    let data = run_ok(cli().args([
        "digest",
        "--chain-id",
        "1",
        "--address",
        "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
        "--nonce",
        "0",
    ]));

    let expected = authorization_signing_hash(&Authorization::new(1, [0xbb; 20], 0));
    assert_eq!(data["digest"], format!("0x{}", hex::encode(expected)));
    assert_eq!(data["chainId"], 1);
}

#[test]
fn cli_signs_and_recovers_authorization() {
    let request = format!(
        r#"{{"chainId": 1, "address": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "nonce": "0x0", "privateKey": "{}"}}"#,
        KEY_ONE
    );
    let signed = run_ok(cli().arg("--compact").arg("sign-authorization").write_stdin(request));

    assert_eq!(signed["address"], "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB");
    assert!(signed.get("privateKey").is_none());

    let recovered = run_ok(cli().arg("recover").write_stdin(signed.to_string()));
    assert_eq!(recovered["signer"], KEY_ONE_ADDRESS);
}

#[test]
fn cli_signs_and_decodes_transaction() {
    let dir = std::env::temp_dir().join(format!("hawala-delegation-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let request_path = dir.join("tx.json");
    std::fs::write(
        &request_path,
        format!(
            r#"{{
                "chainId": 1,
                "nonce": 5,
                "maxPriorityFeePerGas": "1000000000",
                "maxFeePerGas": "2000000000",
                "gasLimit": 100000,
                "to": "{}",
                "selfAuthorizations": [{{"chainId": 1, "address": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "nonce": 6}}],
                "privateKey": "{}"
            }}"#,
            KEY_ONE_ADDRESS, KEY_ONE
        ),
    )
    .expect("write request");

    let signed = run_ok(cli().arg("sign-transaction").arg(&request_path));
    let raw = signed["rawTransaction"].as_str().expect("raw transaction").to_string();
    assert!(raw.starts_with("0x04"));
    assert_eq!(signed["authorizationCount"], 1);

    let decoded = run_ok(cli().args(["decode", raw.as_str()]));
    assert_eq!(decoded["sender"], KEY_ONE_ADDRESS);
    assert_eq!(decoded["authorities"][0], KEY_ONE_ADDRESS);
    assert_eq!(decoded["transactionHash"], signed["transactionHash"]);
    assert_eq!(decoded["authorizationList"][0]["nonce"], 6);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cli_reports_bad_key_as_failure() {
    let request = r#"{"chainId": 1, "address": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "nonce": 0, "privateKey": "0x1234"}"#;
    let response = run_err(cli().arg("sign-authorization").write_stdin(request));

    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["code"], "signing");
    assert!(!response.to_string().contains("0x1234"), "key material must not be echoed");
}

#[test]
fn cli_rejects_non_object_request() {
    run_err(cli().arg("sign-authorization").write_stdin("[1, 2, 3]"));
}

#[test]
fn cli_rejects_plain_http_endpoint() {
    run_err(cli().args([
        "inspect",
        "--rpc-url",
        "http://rpc.example.com",
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
    ]));
}
