//! Command parsing for inbound events.
//!
//! Session-level commands (menu, restart, back, download, follow-ups) are
//! recognised here; everything else is handed to the wizard engine.

use super::engine::WizardEvent;

/// Menu and follow-up choice tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Instruction,
    StartLease,
    ConfirmRestart,
    Continue,
    CommissionTenant,
    CommissionLandlord,
    SkipFollowUps,
}

impl MenuAction {
    pub const ALL: [MenuAction; 7] = [
        Self::Instruction,
        Self::StartLease,
        Self::ConfirmRestart,
        Self::Continue,
        Self::CommissionTenant,
        Self::CommissionLandlord,
        Self::SkipFollowUps,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Instruction => "instruction",
            Self::StartLease => "start_rent",
            Self::ConfirmRestart => "confirm_restart",
            Self::Continue => "continue",
            Self::CommissionTenant => "doc_comm_tenant",
            Self::CommissionLandlord => "doc_comm_sob",
            Self::SkipFollowUps => "skip_comm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Instruction => "📘 Инструкция",
            Self::StartLease => "📄 Договор аренды",
            Self::ConfirmRestart => "🔁 Начать заново",
            Self::Continue => "➡️ Продолжить",
            Self::CommissionTenant => "Комиссия наниматель",
            Self::CommissionLandlord => "Комиссия соб",
            Self::SkipFollowUps => "Пропустить",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }
}

/// A parsed inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: menu, or restart-or-continue when a session is active.
    Start,
    /// `/back` or `назад`.
    Back,
    /// `скачать файл` or `/download`: render what has been collected so far.
    Download,
    Menu(MenuAction),
    /// Anything else goes to the engine.
    Input(WizardEvent),
}

/// Parses inbound text and choice tags into commands.
pub struct CommandParser;

impl CommandParser {
    pub fn parse_text(content: &str) -> Command {
        let lower = content.trim().to_lowercase();
        match lower.as_str() {
            "/start" | "/menu" => Command::Start,
            "/back" | "назад" => Command::Back,
            "/download" | "скачать файл" => Command::Download,
            _ => Command::Input(WizardEvent::Text(content.to_string())),
        }
    }

    pub fn parse_choice(tag: &str) -> Command {
        MenuAction::from_tag(tag).map_or_else(
            || Command::Input(WizardEvent::Choice(tag.to_string())),
            Command::Menu,
        )
    }
}
