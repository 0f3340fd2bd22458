use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (JWT secret, callback token, Daraja credentials) are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "SLM_HOST",
        "SLM_PORT",
        "SLM_DATABASE_URL",
        "SLM_USE_X_FORWARDED_FOR",
        "SLM_USE_FORWARDED",
        "SLM_SHIPPING_FEE",
        "SLM_TAX_RATE_BPS",
        "SLM_PRODUCTS_PER_PAGE",
        "SLM_ORDERS_PER_PAGE",
        "SLM_MAX_CART_ITEMS",
        "SLM_CALLBACK_IP_WHITELIST",
        "SLM_MPESA_ENVIRONMENT",
        "SLM_MPESA_SHORTCODE",
        "SLM_MPESA_CALLBACK_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
