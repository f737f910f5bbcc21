// tests/run_command.rs

use rawexec::run_command;
use rawexec::types::ExecOptions;
use rawexec_test_utils::fake_executor::{FakeExecutor, FakeResponse};
use rawexec_test_utils::init_tracing;

#[tokio::test]
async fn test_success_exits_zero() {
    init_tracing();

    let executor = FakeExecutor::new().respond("echo hi", FakeResponse::stdout("hi\n"));
    let code = run_command(&executor, "echo hi", ExecOptions::default())
        .await
        .unwrap();

    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_exit_code_is_propagated() {
    init_tracing();

    let executor = FakeExecutor::new().respond(
        "exit 3",
        FakeResponse::ExitCode {
            code: 3,
            stderr: String::new(),
        },
    );
    let code = run_command(&executor, "exit 3", ExecOptions::default())
        .await
        .unwrap();

    assert_eq!(code, 3);
}

#[tokio::test]
async fn test_spawn_failure_exits_one() {
    init_tracing();

    let executor = FakeExecutor::new();
    let code = run_command(&executor, "anything", ExecOptions::default())
        .await
        .unwrap();

    assert_eq!(code, 1);
    assert_eq!(executor.executed(), vec!["anything".to_string()]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_executor_signal_maps_to_shell_status() {
    init_tracing();

    let code = run_command(&rawexec::exec::RealExecutor, "kill -TERM $$", ExecOptions::default())
        .await
        .unwrap();

    assert_eq!(code, 128 + libc::SIGTERM);
}
