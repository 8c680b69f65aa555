// tests/plan_loading.rs

mod common;
use crate::common::{init_tracing, TestResult};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deployrun::cli::LogLevel;
use deployrun::config::{
    load_environment, load_inventory, load_plan, load_settings, preflight, EnvironmentLayout,
    Settings,
};
use deployrun::errors::DeployError;
use deployrun::exec::BuildError;
use deployrun::fs::mock::MockFileSystem;
use deployrun::logging::resolve_level;
use deployrun::plan::{
    resolve_step_file, Hosts, Interpreter, PlanEntry, Step, StepAction, StepDefect, StepKind,
    StepPathError,
};
use deployrun::types::OnFailure;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn step(entry: &PlanEntry) -> &Step {
    match entry {
        PlanEntry::Step(step) => step,
        PlanEntry::Defective(d) => panic!("expected a runnable step, got defect {d:?}"),
    }
}

fn defect(entry: &PlanEntry) -> &StepDefect {
    match entry {
        PlanEntry::Defective(d) => &d.defect,
        PlanEntry::Step(s) => panic!("expected a defect, got step {}", s.id),
    }
}

const PLAN: &str = r#"
metadata:
  name: basekit
  version: 1.2
requirements:
  - docker
steps:
  - id: 10
    kind: command
    desc: Say hello
    command: echo hello {env}
  - kind: ansible
    description: Configure web
    hosts: [web, db]
    file: playbooks/site.yml
    args: ["--tags", setup, 3, true]
    timeout: 600
    on_failure: continue
  - id: fan
    kind: command
    hosts:
      - node1
      - node2
    iterate: true
    command: uptime
  - id: script
    kind: python3
    hosts: node1
    file: tools/check.py
"#;

#[test]
fn plan_document_becomes_typed_steps() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "default.yml", PLAN);

    let plan = load_plan(&path)?;
    assert_eq!(plan.len(), 4);

    let meta = plan.metadata.as_ref().ok_or("metadata missing")?;
    assert_eq!(meta.name.as_deref(), Some("basekit"));
    assert_eq!(meta.version.as_deref(), Some("1.2"));

    let first = step(&plan.entries[0]);
    assert_eq!(first.id, "10");
    assert_eq!(first.description(), "Say hello");
    assert!(first.hosts.is_localhost());
    assert_eq!(first.on_failure, OnFailure::Fail);
    assert_eq!(
        first.action,
        StepAction::Command {
            command: "echo hello {env}".to_string()
        }
    );

    let second = step(&plan.entries[1]);
    assert_eq!(second.id, "2");
    assert_eq!(second.hosts, Hosts::Many(vec!["web".into(), "db".into()]));
    assert_eq!(second.timeout, Some(Duration::from_secs(600)));
    assert_eq!(second.on_failure, OnFailure::Continue);
    assert_eq!(
        second.action,
        StepAction::Ansible {
            file: "playbooks/site.yml".to_string(),
            args: vec!["--tags".into(), "setup".into(), "3".into(), "true".into()],
        }
    );

    let fan = step(&plan.entries[2]);
    assert!(fan.iterates());
    let keys: Vec<String> = fan.execution_units().into_iter().map(|u| u.key).collect();
    assert_eq!(keys, vec!["fan_node1", "fan_node2"]);

    let script = step(&plan.entries[3]);
    assert_eq!(script.kind(), StepKind::Script(Interpreter::Python));
    assert_eq!(script.hosts, Hosts::One("node1".to_string()));
    assert_eq!(script.description(), "No description");

    Ok(())
}

#[test]
fn iteration_needs_a_command_with_several_hosts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write(
        dir.path(),
        "p.yml",
        r#"
steps:
  - { id: one, kind: command, command: x, hosts: [a], iterate: true }
  - { id: str, kind: command, command: x, hosts: a, iterate: true }
  - { id: off, kind: command, command: x, hosts: [a, b] }
  - { id: play, kind: ansible, file: f.yml, hosts: [a, b], iterate: true }
"#,
    );

    let plan = load_plan(&path)?;
    for entry in &plan.entries {
        let step = step(entry);
        assert!(!step.iterates(), "{} should not iterate", step.id);
        let units = step.execution_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, step.id);
    }

    Ok(())
}

#[test]
fn malformed_steps_become_defects_in_place() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write(
        dir.path(),
        "p.yml",
        r#"
steps:
  - { id: a, description: no kind here }
  - { id: b, kind: terraform, file: main.tf }
  - { id: c, kind: command }
  - { id: d, kind: command, command: "  " }
  - { id: e, kind: bash }
  - { id: f, kind: "", command: echo }
"#,
    );

    let plan = load_plan(&path)?;
    assert_eq!(plan.len(), 6);

    assert_eq!(defect(&plan.entries[0]), &StepDefect::MissingKind);
    assert_eq!(plan.entries[0].description(), "no kind here");
    assert_eq!(
        defect(&plan.entries[1]),
        &StepDefect::Unbuildable(BuildError::UnknownKind("terraform".to_string()))
    );
    for idx in [2, 3] {
        assert_eq!(
            defect(&plan.entries[idx]),
            &StepDefect::Unbuildable(BuildError::MissingField {
                kind: StepKind::Command,
                field: "command"
            })
        );
    }
    assert_eq!(
        defect(&plan.entries[4]),
        &StepDefect::Unbuildable(BuildError::MissingField {
            kind: StepKind::Script(Interpreter::Bash),
            field: "file"
        })
    );
    assert_eq!(defect(&plan.entries[5]), &StepDefect::MissingKind);

    Ok(())
}

#[test]
fn plan_level_problems_are_configuration_errors() -> TestResult {
    let dir = tempfile::tempdir()?;

    let cases = [
        ("no_steps.yml", "metadata:\n  name: x\n", "must have a 'steps' list"),
        ("empty_steps.yml", "steps: []\n", "no steps defined"),
        (
            "dupes.yml",
            "steps:\n  - { id: 1, kind: command, command: a }\n  - { id: '1', kind: command, command: b }\n",
            "duplicate step id '1'",
        ),
        (
            "zero_timeout.yml",
            "steps:\n  - { kind: command, command: a, timeout: 0 }\n",
            "parsing plan file",
        ),
        (
            "bad_policy.yml",
            "steps:\n  - { kind: command, command: a, on_failure: retry }\n",
            "parsing plan file",
        ),
        ("blank.yml", "\n", "is empty"),
    ];

    for (name, contents, needle) in cases {
        let path = write(dir.path(), name, contents);
        let err = load_plan(&path).unwrap_err();
        assert!(matches!(err, DeployError::ConfigError(_)), "{name}: {err}");
        assert!(err.to_string().contains(needle), "{name}: {err}");
        assert_eq!(err.exit_code().as_i32(), 2);
    }

    let err = load_plan(&dir.path().join("absent.yml")).unwrap_err();
    assert!(err.to_string().contains("plan file not found"));

    Ok(())
}

#[test]
fn step_files_resolve_under_the_data_root() {
    let root = Path::new("/ws/data");
    let allowed = vec![PathBuf::from("/ws/config")];

    assert_eq!(
        resolve_step_file("playbooks/site.yml", root, &allowed).unwrap(),
        Path::new("/ws/data/playbooks/site.yml")
    );
    assert_eq!(
        resolve_step_file("a/../b.sh", root, &allowed).unwrap(),
        Path::new("/ws/data/a/../b.sh")
    );
    assert_eq!(
        resolve_step_file("/ws/config/prod/hook.sh", root, &allowed).unwrap(),
        Path::new("/ws/config/prod/hook.sh")
    );

    assert!(matches!(
        resolve_step_file("/etc/passwd", root, &allowed),
        Err(StepPathError::AbsoluteOutsideAllowed { .. })
    ));
    assert!(matches!(
        resolve_step_file("/ws/config/../../etc/passwd", root, &allowed),
        Err(StepPathError::AbsoluteOutsideAllowed { .. })
    ));
    assert!(matches!(
        resolve_step_file("../secrets.yml", root, &allowed),
        Err(StepPathError::EscapesRoot { .. })
    ));
    assert!(matches!(
        resolve_step_file("a/../../b", root, &allowed),
        Err(StepPathError::EscapesRoot { .. })
    ));
}

#[test]
fn settings_defaults_without_a_file() -> TestResult {
    let settings = Settings::default();
    assert_eq!(settings.paths.workspace, Path::new("/docker-workspace"));
    assert_eq!(settings.paths.data_dir, Path::new("/docker-workspace/data"));
    assert_eq!(settings.paths.config_dir, Path::new("/docker-workspace/config"));
    assert_eq!(
        settings.paths.allowed_prefixes,
        vec![PathBuf::from("/docker-workspace/config")]
    );
    assert_eq!(settings.runner.ssh_connect_timeout, 30);
    assert!(settings.runner.echo_output);
    assert_eq!(
        settings.runner.ansible_config,
        Path::new("/docker-workspace/data/ansible.cfg")
    );
    assert_eq!(
        settings.plan_file("basekit", "default"),
        Path::new("/docker-workspace/data/deployments/basekit/default.yml")
    );

    let layout = settings.layout("prod");
    assert_eq!(
        layout,
        EnvironmentLayout {
            env_dir: PathBuf::from("/docker-workspace/config/prod"),
            inventory_file: PathBuf::from("/docker-workspace/config/prod/config.yml"),
            group_vars_file: PathBuf::from(
                "/docker-workspace/config/prod/group_vars/deployment.yml"
            ),
            ledger_file: PathBuf::from("/docker-workspace/config/prod/.cache/state.json"),
            log_dir: PathBuf::from("/docker-workspace/config/prod/.cache/logs"),
        }
    );

    Ok(())
}

#[test]
fn settings_file_overrides_and_resolves_relative_dirs() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write(
        dir.path(),
        "deployrun.toml",
        r#"
[paths]
workspace = "/srv/ws"
data_dir = "content"
config_dir = "/etc/deploy"

[runner]
ssh_connect_timeout = 10
echo_output = false
"#,
    );

    let settings = load_settings(Some(&path))?;
    assert_eq!(settings.paths.workspace, Path::new("/srv/ws"));
    assert_eq!(settings.paths.data_dir, Path::new("/srv/ws/content"));
    assert_eq!(settings.paths.config_dir, Path::new("/etc/deploy"));
    assert_eq!(settings.paths.allowed_prefixes, vec![PathBuf::from("/etc/deploy")]);
    assert_eq!(settings.runner.ssh_connect_timeout, 10);
    assert!(!settings.runner.echo_output);
    assert_eq!(
        settings.runner.ansible_config,
        Path::new("/srv/ws/content/ansible.cfg")
    );

    Ok(())
}

#[test]
fn invalid_settings_are_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;

    let cases = [
        ("relative_ws.toml", "[paths]\nworkspace = \"ws\"\n"),
        ("relative_prefix.toml", "[paths]\nallowed_prefixes = [\"config\"]\n"),
        ("zero_timeout.toml", "[runner]\nssh_connect_timeout = 0\n"),
        ("unknown_key.toml", "[runner]\nparallel = 4\n"),
        ("not_toml.toml", "this is = = not toml"),
    ];

    for (name, contents) in cases {
        let path = write(dir.path(), name, contents);
        let err = load_settings(Some(&path)).unwrap_err();
        assert_eq!(err.exit_code().as_i32(), 2, "{name}: {err}");
    }

    let err = load_settings(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(err.to_string().contains("settings file not found"));

    Ok(())
}

#[test]
fn environment_vars_accept_both_key_spellings() -> TestResult {
    let dir = tempfile::tempdir()?;
    let layout = EnvironmentLayout::new(dir.path(), "prod");

    write(
        &layout.env_dir,
        "group_vars/deployment.yml",
        "deployment_type: basekit\ndeployment_plan: default\ndomain: example.org\n",
    );
    let vars = load_environment(&layout)?;
    assert_eq!(vars.deployment_type, "basekit");
    assert_eq!(vars.deployment_plan, "default");
    assert!(vars.vars.contains_key("domain"));

    write(
        &layout.env_dir,
        "group_vars/deployment.yml",
        "profile_kind: baremetal\nprofile_name: 3\n",
    );
    let vars = load_environment(&layout)?;
    assert_eq!(vars.deployment_type, "baremetal");
    assert_eq!(vars.deployment_plan, "3");

    write(&layout.env_dir, "group_vars/deployment.yml", "domain: x\n");
    let err = load_environment(&layout).unwrap_err();
    assert!(err.to_string().contains("missing 'deployment_type'"));

    Ok(())
}

#[test]
fn inventory_file_may_be_empty() -> TestResult {
    let dir = tempfile::tempdir()?;
    let empty = write(dir.path(), "empty.yml", "");
    let inventory = load_inventory(&empty)?;
    assert!(inventory.all.hosts.is_empty());

    let real = write(dir.path(), "config.yml", "all:\n  hosts:\n    node1:\n");
    let inventory = load_inventory(&real)?;
    assert!(inventory.resolve("node1").is_ok());

    assert!(load_inventory(&dir.path().join("absent.yml")).is_err());
    Ok(())
}

#[test]
fn preflight_collects_every_problem() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = write(
        dir.path(),
        "p.yml",
        r#"
steps:
  - { id: ok, kind: ansible, file: site.yml }
  - { id: cmd, kind: command, command: echo }
  - { id: nokind }
  - { id: gone, kind: bash, file: missing.sh }
  - { id: outside, kind: sh, file: /etc/evil.sh }
  - { id: alien, kind: terraform }
"#,
    );
    let plan = load_plan(&path)?;

    let fs = MockFileSystem::new();
    fs.add_file("/ws/data/site.yml", "- hosts: all\n");
    let allowed = vec![PathBuf::from("/ws/config")];

    let report = preflight(&plan, Path::new("/ws/data"), &allowed, &fs);
    assert!(!report.is_ok());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("'nokind'"));
    assert_eq!(report.errors.len(), 3);
    assert!(report.errors[0].contains("'gone' file not found: /ws/data/missing.sh"));
    assert!(report.errors[1].contains("'outside'"));
    assert!(report.errors[2].contains("unknown step kind: 'terraform'"));

    Ok(())
}

#[test]
fn preflight_passes_a_clean_plan() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write(
        dir.path(),
        "p.yml",
        "steps:\n  - { kind: python, file: a.py }\n  - { kind: command, command: ls }\n",
    );
    let plan = load_plan(&path)?;

    let fs = MockFileSystem::new();
    fs.add_file("/d/a.py", "print(1)\n");
    let report = preflight(&plan, Path::new("/d"), &[], &fs);
    assert!(report.is_ok());
    assert!(report.warnings.is_empty());

    Ok(())
}

#[test]
fn log_level_prefers_the_flag_then_the_env_var() {
    assert_eq!(
        resolve_level(Some(LogLevel::Debug), Some("error")),
        tracing::Level::DEBUG
    );
    assert_eq!(resolve_level(None, Some("WARNING")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("trace")), tracing::Level::TRACE);
    assert_eq!(resolve_level(None, Some("chatty")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
