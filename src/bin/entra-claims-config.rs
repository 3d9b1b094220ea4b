//! # Claims Provider Configuration Checker
//!
//! A command-line utility that checks a persisted claims provider
//! configuration against a trust, using the same validation as the claims
//! provider, and prints the runtime view the provider would use.
//!
//! ## Usage
//!
//! ### Check a configuration
//!
//! ```bash
//! cargo run --bin entra-claims-config config.json trust.json
//! ```
//!
//! ### Print the default configuration for a trust
//!
//! ```bash
//! cargo run --bin entra-claims-config --default trust.json > config.json
//! ```
//!
//! The trust file holds `name`, `identityClaimType` and `claimTypes`.
//!
//! ## Exit Codes
//!
//! - `0`: The configuration is usable
//! - `1`: The configuration is invalid or a file could not be read

use entra_claims::claims::TrustedLoginProvider;
use entra_claims::config::{EntityProviderConfig, SettingsSnapshot};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <config-file> <trust-file>", args[0]);
        eprintln!("       {} --default <trust-file>", args[0]);
        process::exit(1);
    }

    let trust = match load_trust(Path::new(&args[2])) {
        Ok(trust) => trust,
        Err(e) => {
            eprintln!("❌ Unable to load trust: {}", e);
            process::exit(1);
        }
    };

    if args[1] == "--default" {
        print_default_configuration(&trust);
    } else {
        check_configuration(Path::new(&args[1]), &trust);
    }
}

fn load_trust(path: &Path) -> Result<TrustedLoginProvider, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let trust: TrustedLoginProvider =
        serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))?;
    // goes through new() so the identity claim type is registered
    Ok(TrustedLoginProvider::new(
        trust.name,
        trust.identity_claim_type,
        trust.claim_types,
    ))
}

fn print_default_configuration(trust: &TrustedLoginProvider) {
    let config = EntityProviderConfig::default_configuration(trust.name.clone(), trust);
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    }
}

fn check_configuration(path: &Path, trust: &TrustedLoginProvider) {
    println!("Checking configuration file: {}", path.display());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Unable to read {}: {}", path.display(), e);
            process::exit(1);
        }
    };

    let result = EntityProviderConfig::from_json(&content)
        .and_then(|mut config| {
            config.validate()?;
            config
                .claim_types
                .set_trust_identity_claim_type(trust.identity_claim_type.clone())?;
            Ok(config)
        })
        .and_then(|config| SettingsSnapshot::build(&config, trust));

    match result {
        Ok(settings) => {
            println!("✓ Configuration is valid!");
            print_summary(&settings, trust);
        }
        Err(e) => {
            eprintln!("❌ Configuration is invalid: {}", e);
            if let Some(rule) = e.rule() {
                eprintln!("   Rule: {}", rule);
            }
            process::exit(1);
        }
    }
}

fn print_summary(settings: &SettingsSnapshot, trust: &TrustedLoginProvider) {
    let config = settings.config();
    println!();
    println!("Configuration Summary:");
    println!("  Name: {}", config.name);
    println!("  Version: {}", settings.version());
    println!("  Trust: {} ({})", trust.name, trust.original_issuer());
    println!("  Tenants: {}", config.tenants.len());
    for tenant in &config.tenants {
        println!("    - {} ({:?})", tenant.name, tenant.cloud_instance);
    }
    println!(
        "  Identity: {} <- {}",
        settings.identity_claim_type_config().claim_type,
        settings.identity_claim_type_config().entity_property
    );
    match settings.main_group_claim_type_config() {
        Some(group) => println!("  Groups: {} <- {}", group.claim_type, group.entity_property),
        None => println!("  Groups: not configured"),
    }
    println!("  Runtime claim types: {}", settings.runtime_claim_types().len());
    for item in settings.runtime_claim_types() {
        let claim_type = if item.use_main_claim_type_of_directory_object {
            "(main claim type)"
        } else if item.has_claim_type() {
            item.claim_type.as_str()
        } else {
            "(metadata)"
        };
        println!(
            "    - {} {} -> {}",
            item.entity_type, item.entity_property, claim_type
        );
    }
    println!("  Metadata entries: {}", settings.runtime_metadata_config().len());
    println!("  Augmentation: {}", config.enable_augmentation);
    println!("  Timeout: {} ms", config.timeout_ms);
}
