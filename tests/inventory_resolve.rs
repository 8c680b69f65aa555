// tests/inventory_resolve.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use deployrun::inventory::{
    Group, HostConnection, Inventory, InventoryError, MAX_GROUP_DEPTH,
};

const INVENTORY: &str = r#"
all:
  vars:
    ansible_user: deploy
    ansible_ssh_private_key_file: /keys/shared
  hosts:
    bastion:
      ansible_host: 192.168.0.1
  children:
    web:
      vars:
        ansible_user: www
      hosts:
        node2:
          ansible_host: 10.0.0.2
        node1:
          ansible_host: 10.0.0.1
          ansible_port: "2200"
    db:
      children:
        primary:
          vars:
            ansible_password: group-pass
          hosts:
            db1:
              ansible_host: 10.0.1.1
              ansible_ssh_pass: host-pass
              ansible_port: 2222
        replicas:
          hosts:
            db2:
    empty:
"#;

fn inventory() -> Inventory {
    serde_yaml::from_str(INVENTORY).unwrap()
}

#[test]
fn localhost_never_touches_the_inventory() {
    let conn = Inventory::default().resolve("localhost").unwrap();
    assert!(conn.local);
    assert_eq!(conn.address, "localhost");
    assert_eq!(conn.port, 22);
}

#[test]
fn host_at_the_root_inherits_root_vars() {
    let conn = inventory().resolve("bastion").unwrap();
    assert_eq!(
        conn,
        HostConnection {
            name: "bastion".to_string(),
            address: "192.168.0.1".to_string(),
            user: "deploy".to_string(),
            password: None,
            private_key: Some(PathBuf::from("/keys/shared")),
            port: 22,
            local: false,
        }
    );
}

#[test]
fn group_vars_override_inherited_ones() {
    let conn = inventory().resolve("node2").unwrap();
    assert_eq!(conn.user, "www");
    assert_eq!(conn.address, "10.0.0.2");
    assert_eq!(conn.destination(), "www@10.0.0.2");
}

#[test]
fn string_port_is_accepted() {
    let conn = inventory().resolve("node1").unwrap();
    assert_eq!(conn.port, 2200);
}

#[test]
fn group_name_resolves_to_its_first_host_by_name() {
    let conn = inventory().resolve("web").unwrap();
    assert_eq!(conn.name, "node1");
    assert_eq!(conn.address, "10.0.0.1");
    assert_eq!(conn.user, "www");
}

#[test]
fn group_without_direct_hosts_descends_into_children() {
    let conn = inventory().resolve("db").unwrap();
    assert_eq!(conn.name, "db1");
    assert_eq!(conn.port, 2222);
}

#[test]
fn nested_host_layers_every_level() {
    let conn = inventory().resolve("db1").unwrap();
    assert_eq!(conn.user, "deploy");
    assert_eq!(conn.password.as_deref(), Some("host-pass"));
    assert_eq!(conn.private_key, Some(PathBuf::from("/keys/shared")));
    assert_eq!(conn.port, 2222);
}

#[test]
fn group_password_is_used_when_the_host_sets_none() {
    let yaml = r#"
all:
  children:
    primary:
      vars:
        ansible_password: group-pass
      hosts:
        db1:
"#;
    let inventory: Inventory = serde_yaml::from_str(yaml).unwrap();
    let conn = inventory.resolve("db1").unwrap();
    assert_eq!(conn.password.as_deref(), Some("group-pass"));
}

#[test]
fn host_without_vars_defaults_address_and_user() {
    let yaml = "all:\n  hosts:\n    plain:\n";
    let inventory: Inventory = serde_yaml::from_str(yaml).unwrap();
    let conn = inventory.resolve("plain").unwrap();
    assert_eq!(conn.address, "plain");
    assert_eq!(conn.user, "root");
    assert_eq!(conn.port, 22);
}

#[test]
fn unknown_names_are_reported() {
    let err = inventory().resolve("nowhere").unwrap_err();
    assert_eq!(err, InventoryError::HostNotFound("nowhere".to_string()));
    assert_eq!(err.to_string(), "host or group 'nowhere' not found in inventory");
}

#[test]
fn empty_group_is_not_a_match() {
    let err = inventory().resolve("empty").unwrap_err();
    assert!(matches!(err, InventoryError::HostNotFound(_)));
}

#[test]
fn invalid_port_is_an_error() {
    let yaml = "all:\n  hosts:\n    bad:\n      ansible_port: ssh\n";
    let inventory: Inventory = serde_yaml::from_str(yaml).unwrap();
    let err = inventory.resolve("bad").unwrap_err();
    assert_eq!(
        err,
        InventoryError::InvalidPort {
            host: "bad".to_string(),
            value: "ssh".to_string()
        }
    );
}

#[test]
fn empty_document_parses_to_an_empty_inventory() {
    let inventory: Inventory = serde_yaml::from_str("all:\n").unwrap();
    assert!(inventory.all.hosts.is_empty());
    assert!(inventory.all.children.is_empty());
}

#[test]
fn runaway_nesting_stops_at_the_depth_limit() {
    let mut group = Group::default();
    for level in (0..=MAX_GROUP_DEPTH + 1).rev() {
        let mut parent = Group::default();
        let mut children = BTreeMap::new();
        children.insert(format!("level{level}"), Some(group));
        parent.children = children;
        group = parent;
    }
    let inventory = Inventory { all: group };

    let err = inventory.resolve("missing").unwrap_err();
    assert_eq!(
        err,
        InventoryError::TooDeep {
            limit: MAX_GROUP_DEPTH
        }
    );
}

#[test]
fn localhost_ignores_an_inventory_entry_of_the_same_name() {
    let yaml = "all:\n  hosts:\n    localhost:\n      ansible_host: 10.9.9.9\n      ansible_user: ghost\n";
    let inventory: Inventory = serde_yaml::from_str(yaml).unwrap();
    let conn = inventory.resolve("localhost").unwrap();
    assert!(conn.local);
    assert_eq!(conn.address, "localhost");
}
