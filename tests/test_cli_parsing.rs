// Focused CLI parsing tests (tests command-line parsing only, not business logic)

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use vnetctl::cli::{Cli, Commands};
use vnetctl::commands::supported_commands;

#[test]
fn test_all_commands_parse() {
    let test_cases = vec![
        vec!["vnetctl", "vnet"],
        vec!["vnetctl", "vnet", "--diag"],
        vec!["vnetctl", "vnet-ssh-autoconfig"],
        vec!["vnetctl", "--home", "/tmp/profile", "vnet"],
        vec!["vnetctl", "vnet", "--debug"],
    ];

    for args in test_cases {
        Cli::try_parse_from(&args).unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", args, e));
    }
}

#[test]
fn test_diag_defaults_to_off() {
    let cli = Cli::try_parse_from(["vnetctl", "vnet"]).unwrap();
    match cli.cmd {
        Commands::Vnet(args) => assert!(!args.diag),
        _ => panic!("Expected vnet command"),
    }

    let cli = Cli::try_parse_from(["vnetctl", "vnet", "--diag"]).unwrap();
    match cli.cmd {
        Commands::Vnet(args) => assert!(args.diag),
        _ => panic!("Expected vnet command"),
    }
}

#[test]
fn test_diag_flag_is_hidden() {
    let cmd = Cli::command();
    let vnet = cmd.find_subcommand("vnet").expect("vnet subcommand");
    let diag = vnet
        .get_arguments()
        .find(|a| a.get_id().as_str() == "diag")
        .expect("diag flag");
    assert!(diag.is_hide_set());
}

#[test]
fn test_global_options() {
    let cli = Cli::try_parse_from([
        "vnetctl",
        "vnet-ssh-autoconfig",
        "--home",
        "/tmp/profile",
        "--config",
        "/tmp/vnet.toml",
    ])
    .unwrap();
    assert_eq!(cli.home, Some(PathBuf::from("/tmp/profile")));
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/vnet.toml")));
    assert!(matches!(cli.cmd, Commands::VnetSshAutoconfig));
}

#[test]
fn test_ssh_autoconfig_takes_no_flags() {
    assert!(Cli::try_parse_from(["vnetctl", "vnet-ssh-autoconfig", "--diag"]).is_err());
}

#[test]
fn test_registered_subcommands_match_supported_commands() {
    let cmd = Cli::command();
    let mut registered: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
    registered.retain(|name| *name != "help");
    registered.sort();

    let mut supported = supported_commands();
    supported.sort();

    assert_eq!(registered, supported);
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
#[test]
fn test_platform_commands_not_registered() {
    for name in [
        "vnet-admin-setup",
        "vnet-daemon",
        "vnet-service",
        "vnet-install-service",
        "vnet-uninstall-service",
    ] {
        assert!(
            Cli::try_parse_from(["vnetctl", name]).is_err(),
            "{} should not parse on this platform",
            name
        );
    }
}

#[cfg(target_os = "macos")]
#[test]
fn test_admin_setup_parses() {
    use vnetctl::cli::PlatformCommands;

    let cli = Cli::try_parse_from([
        "vnetctl",
        "vnet-admin-setup",
        "--socket-path",
        "/var/run/vnet.sock",
        "--ipv6-prefix",
        "fd00:1:2:3::/64",
        "--dns-addr",
        "fd00:1:2:3::2",
        "--euid",
        "501",
        "--egid",
        "20",
    ])
    .unwrap();
    match cli.cmd {
        Commands::Platform(PlatformCommands::VnetAdminSetup(args)) => {
            assert_eq!(args.socket_path, "/var/run/vnet.sock");
            assert_eq!(args.euid, 501);
            assert_eq!(args.egid, 20);
        }
        _ => panic!("Expected vnet-admin-setup command"),
    }
}

#[test]
fn test_cli_debug_assert() {
    Cli::command().debug_assert();
}
