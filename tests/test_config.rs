use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use fileport::config::{Args, Config, ServerConfig};

#[test]
fn test_config_defaults() {
    let cfg = ServerConfig::default();

    assert_eq!(cfg.root, PathBuf::from("."));
    assert_eq!(cfg.max_connections, 512);
    assert_eq!(cfg.max_header_len, 2048);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_port_flag_listens_on_all_interfaces() {
    let args = Args::try_parse_from(["fileport", "-p", "8080"]).unwrap();
    let cfg = Config::from_args(args).unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    assert_eq!(cfg.server, ServerConfig::default());
}

#[test]
fn test_config_long_port_flag() {
    let args = Args::try_parse_from(["fileport", "--port", "3000"]).unwrap();

    assert_eq!(args.port, 3000);
}

#[test]
fn test_config_malformed_port_is_rejected() {
    assert!(Args::try_parse_from(["fileport", "-p", "http"]).is_err());
    assert!(Args::try_parse_from(["fileport", "-p", "70000"]).is_err());
}

#[test]
fn test_config_with_port() {
    let cfg = Config::with_port(5000);

    assert_eq!(cfg.listen_addr.port(), 5000);
    assert!(cfg.listen_addr.ip().is_unspecified());
}

#[test]
fn test_config_yaml_overrides_defaults() {
    let cfg = ServerConfig::from_yaml("root: /srv/files\nmax_connections: 4\n").unwrap();

    assert_eq!(cfg.root, PathBuf::from("/srv/files"));
    assert_eq!(cfg.max_connections, 4);
    assert_eq!(cfg.max_header_len, 2048);
}

#[test]
fn test_config_yaml_rejects_unknown_fields() {
    assert!(ServerConfig::from_yaml("listen: 0.0.0.0:80\n").is_err());
}

#[test]
fn test_config_yaml_validation() {
    assert!(ServerConfig::from_yaml("max_connections: 0\n").is_err());
    assert!(ServerConfig::from_yaml("max_header_len: 16\n").is_err());
    assert!(ServerConfig::from_yaml("max_header_len: 64\n").is_ok());
}

#[test]
fn test_config_file_from_command_line() {
    let path = std::env::temp_dir().join(format!("fileport-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "max_connections: 8\nmax_header_len: 4096\n").unwrap();

    let args = Args::try_parse_from([
        "fileport",
        "-p",
        "9000",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let cfg = Config::from_args(args).unwrap();

    assert_eq!(cfg.server.max_connections, 8);
    assert_eq!(cfg.server.max_header_len, 4096);
    assert_eq!(cfg.listen_addr.port(), 9000);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_missing_file_is_an_error() {
    let args = Args::try_parse_from([
        "fileport",
        "-p",
        "9000",
        "-c",
        "/nonexistent/fileport.yaml",
    ])
    .unwrap();

    assert!(Config::from_args(args).is_err());
}
