//! Mock session integration tests.
//!
//! These exercise the registration/matching engine and verify that every
//! execution mode of the in-memory double honours the same contract as
//! the live session.

use std::time::Duration;

use regex::Regex;

use ssh_relay::{ExecuteOptions, MockSession, SshRelayError, TIMEOUT_EXIT_CODE};

fn options() -> ExecuteOptions {
    ExecuteOptions::new()
}

// ============================================================================
// execute: stub resolution
// ============================================================================

#[tokio::test]
async fn test_execute_returns_defined_stdout() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("myhostname\n");
    });

    let response = session.execute("hostname", &options()).await.unwrap();
    assert_eq!(response.stdout, "myhostname\n");
    assert_eq!(response.stderr, "");
    assert_eq!(response.exit_code, Some(0));
}

#[tokio::test]
async fn test_execute_returns_defined_stderr() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("myhostname\n").stderr("error\n");
    });

    let response = session.execute("hostname", &options()).await.unwrap();
    assert_eq!(response.stderr, "error\n");
}

#[tokio::test]
async fn test_execute_returns_defined_exit_code() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.exit_code(50);
    });

    let response = session.execute("hostname", &options()).await.unwrap();
    assert_eq!(response.exit_code, Some(50));
    assert!(!response.success());
}

#[tokio::test]
async fn test_derived_stdout_reevaluated_per_call() {
    let mut session = MockSession::new();
    session.register_command(Regex::new(r"\Aapt install (\w+)").unwrap(), |c| {
        c.stdout_with(|m| format!("Installed {} successfully", m.get(1).unwrap_or("")));
    });

    let response = session.execute("apt install nginx", &options()).await.unwrap();
    assert_eq!(response.stdout, "Installed nginx successfully");

    let response = session
        .execute("apt install varnish", &options())
        .await
        .unwrap();
    assert_eq!(response.stdout, "Installed varnish successfully");
}

#[tokio::test]
async fn test_derived_stderr() {
    let mut session = MockSession::new();
    session.register_command(Regex::new(r"\Aapt install (\w+)").unwrap(), |c| {
        c.stderr_with(|m| format!("Failed to install {}", m.get(1).unwrap_or("")));
    });

    let response = session.execute("apt install nginx", &options()).await.unwrap();
    assert_eq!(response.stderr, "Failed to install nginx");

    let response = session
        .execute("apt install apache", &options())
        .await
        .unwrap();
    assert_eq!(response.stderr, "Failed to install apache");
}

#[tokio::test]
async fn test_derived_exit_code() {
    let mut session = MockSession::new();
    session.register_command(Regex::new(r"\Aapt install (\w+)").unwrap(), |c| {
        c.exit_code_with(|m| if m.get(1) == Some("nginx") { 0 } else { 100 });
    });

    let response = session.execute("apt install nginx", &options()).await.unwrap();
    assert_eq!(response.exit_code, Some(0));

    let response = session
        .execute("apt install apache", &options())
        .await
        .unwrap();
    assert_eq!(response.exit_code, Some(100));
}

// ============================================================================
// Composition and matching
// ============================================================================

#[tokio::test]
async fn test_chain_composes_before_matching() {
    let mut session = MockSession::new();
    session.register_command("apt update && apt upgrade -y", |c| {
        c.stdout("done\n");
    });

    let response = session
        .execute(vec!["apt update", "apt upgrade -y"], &options())
        .await
        .unwrap();
    assert_eq!(response.stdout, "done\n");
    assert_eq!(
        session.executed_commands(),
        ["apt update && apt upgrade -y"]
    );
}

#[tokio::test]
async fn test_sudo_chain_composes_before_matching() {
    let mut session = MockSession::new();
    session.register_command("sudo --stdin apt update && sudo --stdin apt upgrade -y", |c| {
        c.stdout("done\n");
    });

    let response = session
        .execute(
            vec!["apt update", "apt upgrade -y"],
            &ExecuteOptions::new().sudo(),
        )
        .await
        .unwrap();
    assert!(response.success());
}

#[tokio::test]
async fn test_undefined_command_is_distinct_error() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("web-01\n");
    });

    let err = session.execute("uptime", &options()).await.unwrap_err();
    assert!(matches!(err, SshRelayError::UndefinedCommand(_)));
    // Never the error kind a real execution failure produces.
    assert!(!matches!(err, SshRelayError::CommandFailed { .. }));
}

#[tokio::test]
async fn test_first_registered_wins_regardless_of_specificity() {
    let mut session = MockSession::new();
    session.register_command(Regex::new(r"apt").unwrap(), |c| {
        c.stdout("generic\n");
    });
    session.register_command("apt install nginx", |c| {
        c.stdout("exact\n");
    });

    let response = session
        .execute("apt install nginx", &options())
        .await
        .unwrap();
    assert_eq!(response.stdout, "generic\n");
}

#[tokio::test]
async fn test_execution_log_appends_once_per_call() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("web-01\n");
    });

    session.execute("hostname", &options()).await.unwrap();
    session.execute("hostname", &options()).await.unwrap();
    session
        .execute_with_timeout("hostname", &options())
        .await
        .unwrap();

    assert_eq!(
        session.executed_commands(),
        ["hostname", "hostname", "hostname"]
    );
}

// ============================================================================
// execute_with_timeout
// ============================================================================

#[tokio::test]
async fn test_timeout_when_stub_outlives_allowed_time() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.runs_for(Duration::from_secs(35));
    });

    let response = session
        .execute_with_timeout("hostname", &ExecuteOptions::new().timeout(Duration::from_secs(10)))
        .await
        .unwrap();

    assert_eq!(response.exit_code, Some(TIMEOUT_EXIT_CODE));
    assert_eq!(
        response.stderr,
        "Command did not finish executing within the allowed 10 seconds."
    );
    assert_eq!(response.command, "hostname");
    assert!(response.is_timeout());
}

#[tokio::test]
async fn test_no_timeout_when_stub_fits_allowed_time() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("blah\n").runs_for(Duration::from_secs(5));
    });

    let response = session
        .execute_with_timeout("hostname", &ExecuteOptions::new().timeout(Duration::from_secs(10)))
        .await
        .unwrap();

    assert_eq!(response.exit_code, Some(0));
    assert_eq!(response.stdout, "blah\n");
}

#[tokio::test]
async fn test_timeout_defaults_to_thirty_seconds() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.runs_for(Duration::from_secs(35));
    });

    let response = session
        .execute_with_timeout("hostname", &options())
        .await
        .unwrap();
    assert!(response.stderr.contains("30 seconds"));
}

#[tokio::test]
async fn test_timeout_logs_the_command_once() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.runs_for(Duration::from_secs(35));
    });

    session
        .execute_with_timeout("hostname", &ExecuteOptions::new().timeout(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(session.executed_commands(), ["hostname"]);
}

#[tokio::test]
async fn test_timeout_undefined_command_still_errors() {
    let mut session = MockSession::new();
    let err = session
        .execute_with_timeout("hostname", &options())
        .await
        .unwrap_err();
    assert!(matches!(err, SshRelayError::UndefinedCommand(_)));
}

// ============================================================================
// execute_with_success
// ============================================================================

#[tokio::test]
async fn test_success_returns_response_on_match() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.exit_code(0);
    });

    let result = session
        .execute_with_success("hostname", &options())
        .await
        .unwrap();
    assert!(result.is_some());
}

#[tokio::test]
async fn test_success_returns_none_on_mismatch() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.exit_code(50);
    });

    let result = session
        .execute_with_success("hostname", &options())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_success_honours_nonzero_expected_code() {
    let mut session = MockSession::new();
    session.register_command("diff a b", |c| {
        c.exit_code(1);
    });

    let result = session
        .execute_with_success("diff a b", &ExecuteOptions::new().success_code(1))
        .await
        .unwrap();
    assert!(result.is_some());

    let result = session
        .execute_with_success("diff a b", &ExecuteOptions::new().success_code(0))
        .await
        .unwrap();
    assert!(result.is_none());
}

// ============================================================================
// execute_checked
// ============================================================================

#[tokio::test]
async fn test_checked_returns_response_on_match() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.exit_code(0);
    });

    let response = session
        .execute_checked("hostname", &options())
        .await
        .unwrap();
    assert!(response.success());
}

#[tokio::test]
async fn test_checked_error_carries_combined_output() {
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("partial\n").stderr("boom").exit_code(50);
    });

    let err = session
        .execute_checked("hostname", &options())
        .await
        .unwrap_err();
    match err {
        SshRelayError::CommandFailed { output } => {
            assert_eq!(output, "partial\n\nboom");
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

// ============================================================================
// write_data / close
// ============================================================================

#[tokio::test]
async fn test_write_data_records_and_returns_length() {
    let mut session = MockSession::new();
    let written = session
        .write_data("/etc/motd", b"hello fleet", &options())
        .await
        .unwrap();

    assert_eq!(written, 11);
    assert_eq!(
        session.written_data(),
        [(String::from("/etc/motd"), b"hello fleet".to_vec())]
    );
}

#[tokio::test]
async fn test_close_marks_session_closed() {
    let mut session = MockSession::new();
    assert!(!session.is_closed());
    session.close().await;
    assert!(session.is_closed());
}

// ============================================================================
// Instance lifecycle hooks
// ============================================================================

#[tokio::test]
async fn test_execute_hooks_fire_in_order() {
    use ssh_relay::{Action, EventArgs};
    use std::sync::{Arc, Mutex};

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.stdout("web-01\n");
    });

    {
        let seen = Arc::clone(&seen);
        session.hooks_mut().before(Action::Execute, move |args| {
            if let EventArgs::Command(command) = args {
                seen.lock().unwrap().push(format!("before:{}", command));
            }
        });
    }
    {
        let seen = Arc::clone(&seen);
        session.hooks_mut().after(Action::Execute, move |args| {
            if let EventArgs::Response(response) = args {
                seen.lock().unwrap().push(format!("after:{}", response.stdout.trim()));
            }
        });
    }

    session.execute("hostname", &options()).await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        ["before:hostname", "after:web-01"]
    );
}

#[tokio::test]
async fn test_timeout_sentinel_skips_after_hook() {
    use ssh_relay::Action;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let after_count = Arc::new(AtomicUsize::new(0));
    let mut session = MockSession::new();
    session.register_command("hostname", |c| {
        c.runs_for(Duration::from_secs(35));
    });
    {
        let count = Arc::clone(&after_count);
        session.hooks_mut().after(Action::Execute, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }

    session
        .execute_with_timeout("hostname", &ExecuteOptions::new().timeout(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(after_count.load(Ordering::SeqCst), 0);
}
