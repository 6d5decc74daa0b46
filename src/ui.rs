use colored::*;
use terminal_size::{Width, Height, terminal_size};

use crate::chat::{Followup, SlashCommand};

pub fn print_header(model: &str, provider: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let width = width.0 as usize;

    let line = "─".repeat(width);
    println!("{}", line.black().bold());

    let name = "API Center Chat".blue().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);

    let info = format!("  {}  •  {}", model, provider).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
}

pub fn print_commands(commands: &[SlashCommand]) {
    for command in commands {
        println!("  {} {}", format!("/{:<10}", command.name).cyan().bold(), command.description);
    }
}

pub fn print_followup(followup: &Followup) {
    println!("\n  {} {}  {}", "→".cyan(), followup.title, followup.message.cyan().bold());
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    println!("  {} {}", "❌".red().bold(), msg.red());
}

pub fn print_thinking(msg: &str) {
    println!("  {} {}...", "∴".magenta(), msg);
}
