use crate::format::{LogNotification, NotificationField, user_mention};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    Ban,
    Unban,
    Kick,
    Timeout,
    Untimeout,
    Mute,
    Unmute,
}

impl ModerationAction {
    pub fn color(self) -> u32 {
        match self {
            Self::Ban => 0xFF_00_00,
            Self::Unban => 0x00_FF_00,
            Self::Kick => 0xFF_A5_00,
            Self::Timeout => 0xFF_D7_00,
            Self::Untimeout => 0x32_CD_32,
            Self::Mute => 0xA5_2A_2A,
            Self::Unmute => 0x98_FB_98,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Ban => "🔨",
            Self::Unban => "🔓",
            Self::Kick => "👢",
            Self::Timeout => "⏰",
            Self::Untimeout => "✅",
            Self::Mute => "🔇",
            Self::Unmute => "🔊",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ban => "Ban",
            Self::Unban => "Unban",
            Self::Kick => "Kick",
            Self::Timeout => "Timeout",
            Self::Untimeout => "Untimeout",
            Self::Mute => "Mute",
            Self::Unmute => "Unmute",
        }
    }
}

/// A moderation action performed by a command, to be recorded in the guild's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModerationEntry {
    pub action: ModerationAction,
    pub target_id: u64,
    pub moderator_id: u64,
    pub reason: Option<String>,
    pub duration: Option<String>,
    pub extra_fields: Vec<NotificationField>,
}

impl ModerationEntry {
    pub fn new(action: ModerationAction, target_id: u64, moderator_id: u64) -> Self {
        Self {
            action,
            target_id,
            moderator_id,
            reason: None,
            duration: None,
            extra_fields: Vec::new(),
        }
    }

    pub fn reason(mut self, reason: Option<impl Into<String>>) -> Self {
        self.reason = reason.map(Into::into);
        self
    }

    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.extra_fields.push(NotificationField::new(name, value, inline));
        self
    }

    pub fn to_notification(&self) -> LogNotification {
        let mut notification = LogNotification::new(self.action.color())
            .title(format!("{} {}", self.action.emoji(), self.action.label()))
            .field("👤 User", user_mention(Some(self.target_id)), true)
            .field("🛠️ Moderator", user_mention(Some(self.moderator_id)), true);

        if let Some(reason) = self.reason.as_deref().filter(|reason| !reason.trim().is_empty()) {
            notification = notification.field("📄 Reason", reason.replace('@', "@\u{200B}"), false);
        }

        if let Some(duration) = self.duration.as_deref() {
            notification = notification.field("⏳ Duration", duration, false);
        }

        for field in &self.extra_fields {
            notification.fields.push(field.clone());
        }

        notification
    }
}

#[cfg(test)]
mod tests {
    use super::{ModerationAction, ModerationEntry};

    #[test]
    fn timeout_entry_lists_reason_and_duration() {
        let entry = ModerationEntry::new(ModerationAction::Timeout, 5, 6)
            .reason(Some("spam @everyone"))
            .duration("10m")
            .field("Case", "#3", true);

        let notification = entry.to_notification();
        assert_eq!(notification.color, 0xFF_D7_00);
        assert_eq!(notification.title.as_deref(), Some("⏰ Timeout"));

        let names: Vec<&str> = notification.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["👤 User", "🛠️ Moderator", "📄 Reason", "⏳ Duration", "Case"]);
        assert_eq!(notification.fields[0].value, "<@5>");
        assert_eq!(notification.fields[2].value, "spam @\u{200B}everyone");
    }

    #[test]
    fn blank_reason_is_omitted() {
        let notification = ModerationEntry::new(ModerationAction::Kick, 1, 2)
            .reason(Some("   "))
            .to_notification();
        assert_eq!(notification.fields.len(), 2);
    }
}
