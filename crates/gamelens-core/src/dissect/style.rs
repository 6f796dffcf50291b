//! ANSI styling for dissected output.
//!
//! The palette mirrors the wire direction: host traffic renders on a blue
//! background, node traffic on a grey one, and diagnostics on red regardless
//! of direction. Styling can be switched off so piped output and tests see
//! plain text.

/// Which side of the connection produced the payload.
///
/// The capture collaborator resolves this once per payload by comparing the
/// source address against the configured server host. The role selects the
/// active schema subtree and the color background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Node,
}

impl Role {
    /// Upper-case tag used in unrecognized-record and diagnostic lines.
    pub fn tag(self) -> &'static str {
        match self {
            Role::Host => "HOST",
            Role::Node => "NODE",
        }
    }

    /// Direction arrow shown in front of action titles.
    pub fn arrow(self) -> &'static str {
        match self {
            Role::Host => "<--",
            Role::Node => "-->",
        }
    }

    fn background(self) -> &'static str {
        match self {
            Role::Host => "44",
            Role::Node => "100",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Node => write!(f, "node"),
        }
    }
}

/// Text style applied to one rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Title,
    Normal,
    Bold,
    Light,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Title => "00;93",
            Style::Normal => "00;30",
            Style::Bold => "00;37",
            Style::Light => "00;96",
        }
    }
}

const ERROR_CODE: &str = "00;37;41";
const RESET: &str = "\x1b[0m";

/// Renders text fragments with the role palette, or verbatim when color is
/// disabled.
#[derive(Debug, Clone, Copy)]
pub struct Styler {
    role: Role,
    color: bool,
}

impl Styler {
    pub fn new(role: Role, color: bool) -> Self {
        Self { role, color }
    }

    pub fn paint(&self, text: &str, style: Style) -> String {
        if !self.color {
            return text.to_string();
        }
        format!(
            "\x1b[{};{}m{text}{RESET}",
            style.code(),
            self.role.background()
        )
    }

    pub fn paint_error(&self, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{ERROR_CODE}m{text}{RESET}")
    }
}

/// Render the full style/color grid, one string per output line.
///
/// Maintenance helper for picking palette entries; exposed through the CLI
/// `palette` subcommand.
pub fn format_table() -> Vec<String> {
    let styles = [0, 1, 2, 3, 4, 7, 9, 21];
    let foregrounds = [
        30, 31, 32, 33, 34, 35, 36, 37, 90, 91, 92, 93, 94, 95, 96,
    ];
    let backgrounds = [40, 41, 42, 43, 44, 45, 46, 47, 100];

    let mut lines = Vec::new();
    for style in styles {
        lines.push(String::new());
        lines.push(format!("Style: {style:02}"));
        for foreground in foregrounds {
            let mut line = String::new();
            for background in backgrounds {
                let code = format!("{style:02};{foreground:02};{background:02}");
                line.push_str(&format!("\x1b[{code}m {code} {RESET}"));
            }
            lines.push(line);
        }
    }
    lines
}
