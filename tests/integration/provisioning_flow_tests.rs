//! Integration tests for the provisioning orchestrator.
//!
//! Drives a [`Provisioner`] through modem discovery, context preparation
//! and property writes against the recording mock, answering requests the
//! way the telephony daemon would.

use cellprov::app::ports::{ContextProperty, PropertyValue};
use cellprov::config::{ContextPolicy, ServiceConfig};
use cellprov::decoder;
use cellprov::events::{ContextInfo, Notice, RpcError, SimInfo};
use cellprov::fsm::task::{ContextKind, TaskState};
use cellprov::fsm::{Completion, Outcome, Provisioner, SessionId};
use cellprov::settings::ProvisioningSettings;

use crate::mock_telephony::{
    Call, INTERNET_CTX, IMSI, MMS_CTX, MODEM, MockTelephony, both_contexts, contexts, modem, sim,
};

fn sonera() -> ProvisioningSettings {
    let text = std::fs::read_to_string(format!(
        "{}/tests/data/sonera.xml",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    decoder::decode_xml(&text).unwrap()
}

fn internet_only() -> ProvisioningSettings {
    ProvisioningSettings { mms: None, ..sonera() }
}

fn failed(name: &str) -> RpcError {
    RpcError::new(format!("org.ofono.Error.{name}"), "")
}

/// Start a session and answer discovery up to the connection manager.
fn discover(
    p: &mut Provisioner,
    port: &mut MockTelephony,
    settings: ProvisioningSettings,
    info: cellprov::events::ConnectionManagerInfo,
) -> SessionId {
    let id = p.provision(IMSI, settings, port);
    p.handle(
        Notice::Manager { request: port.manager(), result: Ok(vec![modem(MODEM)]) },
        port,
    );
    p.handle(Notice::Sim { request: port.sim(MODEM), result: Ok(sim(IMSI)) }, port);
    p.handle(
        Notice::ConnectionManager { request: port.connection_manager(MODEM), result: Ok(info) },
        port,
    );
    id
}

fn context_ready(p: &mut Provisioner, port: &mut MockTelephony, context: &str, active: bool) {
    p.handle(
        Notice::Context {
            request: port.context_watch(context),
            result: Ok(ContextInfo { active }),
        },
        port,
    );
}

/// Complete every write on `context`, failing those for which `fail` is true.
fn answer_writes(
    p: &mut Provisioner,
    port: &mut MockTelephony,
    context: &str,
    fail: impl Fn(ContextProperty) -> bool,
) {
    for (request, property, _) in port.writes(context) {
        let result = if fail(property) { Err(failed("Failed")) } else { Ok(()) };
        p.handle(Notice::RequestDone { request, result }, port);
    }
}

fn single(p: &mut Provisioner) -> Completion {
    let mut done = p.take_completions();
    assert_eq!(done.len(), 1, "expected exactly one completion: {done:?}");
    done.remove(0)
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn full_document_provisions_both_contexts() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let id = discover(&mut p, &mut port, sonera(), both_contexts());

    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    context_ready(&mut p, &mut port, MMS_CTX, false);
    assert_eq!(p.task_state(id, ContextKind::Internet), Some(TaskState::Provisioning));

    assert_eq!(port.writes(INTERNET_CTX).len(), 5);
    assert_eq!(port.writes(MMS_CTX).len(), 7);
    let str_of = |ctx, prop| port.written(ctx, prop);
    assert_eq!(
        str_of(INTERNET_CTX, ContextProperty::AccessPointName),
        Some(PropertyValue::Str("internet".into()))
    );
    assert_eq!(
        str_of(INTERNET_CTX, ContextProperty::AuthenticationMethod),
        Some(PropertyValue::Str("pap".into()))
    );
    assert_eq!(
        str_of(MMS_CTX, ContextProperty::MessageProxy),
        Some(PropertyValue::Str("195.156.25.33:80".into()))
    );
    assert_eq!(
        str_of(MMS_CTX, ContextProperty::MessageCenter),
        Some(PropertyValue::Str("http://mms.sonera.fi:8002/".into()))
    );
    assert_eq!(
        str_of(MMS_CTX, ContextProperty::Username),
        Some(PropertyValue::Str(String::new()))
    );

    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    assert!(p.take_completions().is_empty(), "MMS still in flight");
    answer_writes(&mut p, &mut port, MMS_CTX, |_| false);

    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Success);
    assert_eq!(done.identity, IMSI);
    assert_eq!(done.context_path, MODEM);
    assert!(p.is_idle());
    assert!(!p.is_live(id));
    assert!(port.is_cancelled(port.deadline()), "deadline outlived the session");
}

#[test]
fn one_failed_write_is_partial_success() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    discover(&mut p, &mut port, sonera(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    context_ready(&mut p, &mut port, MMS_CTX, false);

    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    answer_writes(&mut p, &mut port, MMS_CTX, |prop| prop == ContextProperty::MessageProxy);

    assert_eq!(single(&mut p).outcome, Outcome::PartialSuccess);
}

#[test]
fn every_task_failing_is_failure() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    discover(&mut p, &mut port, sonera(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    p.handle(
        Notice::Context { request: port.context_watch(MMS_CTX), result: Err(failed("Timedout")) },
        &mut port,
    );
    answer_writes(&mut p, &mut port, INTERNET_CTX, |prop| prop == ContextProperty::Password);

    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    assert_eq!(done.context_path, MODEM);
}

// ── Context preparation ───────────────────────────────────────

#[test]
fn active_context_is_deactivated_before_writing() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let id = discover(&mut p, &mut port, internet_only(), both_contexts());

    context_ready(&mut p, &mut port, INTERNET_CTX, true);
    assert_eq!(p.task_state(id, ContextKind::Internet), Some(TaskState::Deactivating));
    assert!(port.writes(INTERNET_CTX).is_empty(), "wrote to an active context");
    let first_watch = port.context_watch(INTERNET_CTX);

    let deactivate = port.deactivation(INTERNET_CTX);
    p.handle(Notice::RequestDone { request: deactivate, result: Ok(()) }, &mut port);
    assert!(port.is_cancelled(first_watch));
    assert_ne!(port.context_watch(INTERNET_CTX), first_watch, "context not revalidated");

    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    assert_eq!(p.task_state(id, ContextKind::Internet), Some(TaskState::Provisioning));
    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    assert_eq!(single(&mut p).outcome, Outcome::Success);
}

#[test]
fn active_change_signal_starts_writes() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let id = discover(&mut p, &mut port, internet_only(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, true);

    p.handle(
        Notice::ContextActiveChanged { context: INTERNET_CTX.into(), active: false },
        &mut port,
    );
    assert_eq!(p.task_state(id, ContextKind::Internet), Some(TaskState::Provisioning));
    assert_eq!(port.writes(INTERNET_CTX).len(), 5);

    // The late deactivation reply changes nothing.
    let deactivate = port.deactivation(INTERNET_CTX);
    p.handle(Notice::RequestDone { request: deactivate, result: Ok(()) }, &mut port);
    assert_eq!(port.count(|c| matches!(c, Call::WatchContext(_))), 1);
    assert_eq!(port.writes(INTERNET_CTX).len(), 5);
}

#[test]
fn failed_deactivation_fails_the_task() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    discover(&mut p, &mut port, internet_only(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, true);

    let deactivate = port.deactivation(INTERNET_CTX);
    p.handle(
        Notice::RequestDone { request: deactivate, result: Err(failed("InProgress")) },
        &mut port,
    );
    assert_eq!(single(&mut p).outcome, Outcome::Failure);
    assert!(port.writes(INTERNET_CTX).is_empty());
}

#[test]
fn missing_context_is_skipped_by_default() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let id = discover(
        &mut p,
        &mut port,
        sonera(),
        contexts(&[(INTERNET_CTX, ContextKind::Internet, false)]),
    );
    assert_eq!(p.task_state(id, ContextKind::Mms), None);
    assert_eq!(port.count(|c| matches!(c, Call::AddContext { .. })), 0);

    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    assert_eq!(single(&mut p).outcome, Outcome::Success);
}

#[test]
fn no_context_at_all_fails() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    discover(&mut p, &mut port, sonera(), contexts(&[]));
    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    assert_eq!(done.context_path, MODEM);
    assert!(p.is_idle());
}

#[test]
fn missing_context_is_created_when_configured() {
    let config = ServiceConfig {
        context_policy: ContextPolicy::CreateMissing,
        ..ServiceConfig::default()
    };
    let mut p = Provisioner::new(&config);
    let mut port = MockTelephony::new();
    let id = discover(
        &mut p,
        &mut port,
        sonera(),
        contexts(&[(INTERNET_CTX, ContextKind::Internet, false)]),
    );
    assert_eq!(p.task_state(id, ContextKind::Mms), Some(TaskState::Initializing));

    let created = "/ril_0/context3";
    p.handle(
        Notice::ContextAdded { request: port.add_context("mms"), result: Ok(created.into()) },
        &mut port,
    );
    context_ready(&mut p, &mut port, created, false);
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    assert_eq!(port.writes(created).len(), 7);

    answer_writes(&mut p, &mut port, created, |_| false);
    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    assert_eq!(single(&mut p).outcome, Outcome::Success);
}

#[test]
fn failed_creation_is_partial_success() {
    let config = ServiceConfig {
        context_policy: ContextPolicy::CreateMissing,
        ..ServiceConfig::default()
    };
    let mut p = Provisioner::new(&config);
    let mut port = MockTelephony::new();
    discover(
        &mut p,
        &mut port,
        sonera(),
        contexts(&[(INTERNET_CTX, ContextKind::Internet, false)]),
    );
    p.handle(
        Notice::ContextAdded { request: port.add_context("mms"), result: Err(failed("NotAttached")) },
        &mut port,
    );
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    assert_eq!(single(&mut p).outcome, Outcome::PartialSuccess);
}

// ── Modem discovery ───────────────────────────────────────────

#[test]
fn second_modem_matches_and_first_probe_is_dropped() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, internet_only(), &mut port);
    p.handle(
        Notice::Manager { request: port.manager(), result: Ok(vec![modem("/ril_0"), modem("/ril_1")]) },
        &mut port,
    );
    let first = port.sim("/ril_0");
    p.handle(Notice::Sim { request: port.sim("/ril_1"), result: Ok(sim(IMSI)) }, &mut port);
    assert!(port.is_cancelled(first));
    port.connection_manager("/ril_1");

    // A late answer from the dropped probe is ignored.
    p.handle(Notice::Sim { request: first, result: Ok(sim(IMSI)) }, &mut port);
    assert_eq!(port.count(|c| matches!(c, Call::WatchConnectionManager(_))), 1);
}

#[test]
fn no_matching_sim_fails_with_empty_path() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, sonera(), &mut port);
    p.handle(
        Notice::Manager { request: port.manager(), result: Ok(vec![modem("/ril_0"), modem("/ril_1")]) },
        &mut port,
    );
    p.handle(Notice::Sim { request: port.sim("/ril_0"), result: Ok(sim("244990000000000")) }, &mut port);
    assert!(p.take_completions().is_empty());
    p.handle(
        Notice::Sim {
            request: port.sim("/ril_1"),
            result: Ok(SimInfo { present: false, identity: None }),
        },
        &mut port,
    );

    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    assert_eq!(done.context_path, "");
    assert!(p.is_idle());
}

#[test]
fn manager_failure_fails_session() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, sonera(), &mut port);
    p.handle(
        Notice::Manager { request: port.manager(), result: Err(failed("ServiceUnknown")) },
        &mut port,
    );
    assert_eq!(single(&mut p).outcome, Outcome::Failure);
}

#[test]
fn modem_without_packet_data_fails() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, sonera(), &mut port);
    let mut no_gprs = modem(MODEM);
    no_gprs.interfaces.truncate(1);
    p.handle(Notice::Manager { request: port.manager(), result: Ok(vec![no_gprs]) }, &mut port);
    p.handle(Notice::Sim { request: port.sim(MODEM), result: Ok(sim(IMSI)) }, &mut port);

    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    assert_eq!(done.context_path, MODEM);
}

// ── Deadlines and cancellation ────────────────────────────────

#[test]
fn deadline_rearms_after_every_notice() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, sonera(), &mut port);
    let first = port.deadline();
    assert!(matches!(
        port.calls.iter().find(|(id, _)| *id == first),
        Some((_, Call::Deadline(d))) if *d == ServiceConfig::default().session_timeout()
    ));

    p.handle(Notice::Manager { request: port.manager(), result: Ok(vec![modem(MODEM)]) }, &mut port);
    let second = port.deadline();
    assert_ne!(first, second);
    assert!(port.is_cancelled(first));

    // The superseded deadline firing late does nothing.
    p.handle(Notice::DeadlineElapsed { request: first }, &mut port);
    assert!(p.take_completions().is_empty());
}

#[test]
fn stalled_session_times_out() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    discover(&mut p, &mut port, sonera(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    let writes = port.writes(INTERNET_CTX);
    let mms_watch = port.context_watch(MMS_CTX);

    p.handle(Notice::DeadlineElapsed { request: port.deadline() }, &mut port);
    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    for (request, _, _) in writes {
        assert!(port.is_cancelled(request));
    }
    assert!(port.is_cancelled(mms_watch));
    assert!(p.is_idle());
}

#[test]
fn notices_after_completion_are_ignored() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let id = discover(&mut p, &mut port, internet_only(), both_contexts());
    context_ready(&mut p, &mut port, INTERNET_CTX, false);
    assert!(p.cancel(id, &mut port));
    assert_eq!(single(&mut p).outcome, Outcome::Failure);
    assert!(!p.cancel(id, &mut port), "cancelled twice");

    let calls = port.calls.len();
    answer_writes(&mut p, &mut port, INTERNET_CTX, |_| false);
    p.handle(
        Notice::ContextActiveChanged { context: INTERNET_CTX.into(), active: false },
        &mut port,
    );
    assert!(p.take_completions().is_empty());
    assert_eq!(port.calls.len(), calls, "finished session issued requests");
}

#[test]
fn sessions_are_independent() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    let a = p.provision(IMSI, sonera(), &mut port);
    let manager_a = port.manager();
    let b = p.provision("244059999999999", sonera(), &mut port);
    let manager_b = port.manager();
    assert_ne!(a, b);

    p.handle(Notice::Manager { request: manager_b, result: Err(failed("Failed")) }, &mut port);
    let done = single(&mut p);
    assert_eq!(done.session, b);
    assert!(p.is_live(a));

    p.handle(Notice::Manager { request: manager_a, result: Ok(vec![modem(MODEM)]) }, &mut port);
    assert!(p.take_completions().is_empty());
    p.cancel_all(&mut port);
    assert_eq!(single(&mut p).session, a);
    assert!(p.is_idle());
}

#[test]
fn empty_settings_fail_immediately() {
    let mut p = Provisioner::new(&ServiceConfig::default());
    let mut port = MockTelephony::new();
    p.provision(IMSI, ProvisioningSettings::default(), &mut port);
    let done = single(&mut p);
    assert_eq!(done.outcome, Outcome::Failure);
    assert_eq!(done.context_path, "");
    assert!(port.calls.is_empty());
}
