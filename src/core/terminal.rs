use console::{Emoji, style};

pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");

// Everything here goes to stderr; stdout carries events.

pub fn print_success(msg: &str) {
    eprintln!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_warn(msg: &str) {
    eprintln!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    eprintln!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_usage() {
    eprintln!(
        "\n {} {} <command> [--config <path>]\n",
        style("Usage:").bold(),
        style("wmibeat").green()
    );
    let commands: &[(&str, &str)] = &[
        ("run", "Poll the configured classes until Ctrl+C (default)"),
        ("once", "Run a single poll cycle and exit"),
        ("check", "Validate the config and print the compiled queries"),
        ("help", "Show this message"),
    ];
    for (name, about) in commands {
        eprintln!("   {:<8} {}", style(name).cyan().bold(), about);
    }
    eprintln!(
        "\n Config lookup: --config/-c, then ${}, then ./{}\n",
        crate::core::config::CONFIG_ENV_VAR,
        crate::core::config::DEFAULT_CONFIG_FILE
    );
}
