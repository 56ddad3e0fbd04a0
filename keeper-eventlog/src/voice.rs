use poise::serenity_prelude as serenity;

/// The voice-state fields that drive classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceSnapshot {
    pub channel_id: Option<u64>,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub server_mute: bool,
    pub server_deaf: bool,
}

impl VoiceSnapshot {
    pub fn from_state(state: &serenity::VoiceState) -> Self {
        Self {
            channel_id: state.channel_id.map(|id| id.get()),
            self_mute: state.self_mute,
            self_deaf: state.self_deaf,
            server_mute: state.mute,
            server_deaf: state.deaf,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceFlag {
    ServerMute,
    ServerDeaf,
    SelfMute,
    SelfDeaf,
}

impl VoiceFlag {
    pub fn label(self) -> &'static str {
        match self {
            Self::ServerMute => "Server Mute",
            Self::ServerDeaf => "Server Deafen",
            Self::SelfMute => "Self Mute",
            Self::SelfDeaf => "Self Deafen",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceToggle {
    pub flag: VoiceFlag,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceActivity {
    Joined { channel_id: u64 },
    Left { channel_id: u64 },
    Moved { from: u64, to: u64 },
    StateChanged {
        channel_id: Option<u64>,
        toggles: Vec<VoiceToggle>,
    },
}

/// Classify a voice-state transition. An unknown previous state counts as
/// disconnected with every flag off.
///
/// Channel changes take precedence over flag toggles, so one transition
/// yields at most one activity.
pub fn classify_voice(before: Option<&VoiceSnapshot>, after: &VoiceSnapshot) -> Option<VoiceActivity> {
    let before = before.copied().unwrap_or_default();

    match (before.channel_id, after.channel_id) {
        (None, Some(channel_id)) => return Some(VoiceActivity::Joined { channel_id }),
        (Some(channel_id), None) => return Some(VoiceActivity::Left { channel_id }),
        (Some(from), Some(to)) if from != to => return Some(VoiceActivity::Moved { from, to }),
        _ => {}
    }

    let toggles: Vec<VoiceToggle> = [
        (VoiceFlag::ServerMute, before.server_mute, after.server_mute),
        (VoiceFlag::ServerDeaf, before.server_deaf, after.server_deaf),
        (VoiceFlag::SelfMute, before.self_mute, after.self_mute),
        (VoiceFlag::SelfDeaf, before.self_deaf, after.self_deaf),
    ]
    .into_iter()
    .filter(|(_, old, new)| old != new)
    .map(|(flag, _, enabled)| VoiceToggle { flag, enabled })
    .collect();

    if toggles.is_empty() {
        return None;
    }

    Some(VoiceActivity::StateChanged {
        channel_id: after.channel_id,
        toggles,
    })
}

#[cfg(test)]
mod tests {
    use super::{VoiceActivity, VoiceFlag, VoiceSnapshot, VoiceToggle, classify_voice};

    fn in_channel(channel_id: u64) -> VoiceSnapshot {
        VoiceSnapshot {
            channel_id: Some(channel_id),
            ..VoiceSnapshot::default()
        }
    }

    #[test]
    fn join_leave_and_move() {
        assert_eq!(
            classify_voice(None, &in_channel(1)),
            Some(VoiceActivity::Joined { channel_id: 1 })
        );
        assert_eq!(
            classify_voice(Some(&in_channel(1)), &VoiceSnapshot::default()),
            Some(VoiceActivity::Left { channel_id: 1 })
        );
        assert_eq!(
            classify_voice(Some(&in_channel(1)), &in_channel(2)),
            Some(VoiceActivity::Moved { from: 1, to: 2 })
        );
    }

    #[test]
    fn self_mute_toggle_is_reported() {
        let muted = VoiceSnapshot {
            self_mute: true,
            ..in_channel(1)
        };

        assert_eq!(
            classify_voice(Some(&in_channel(1)), &muted),
            Some(VoiceActivity::StateChanged {
                channel_id: Some(1),
                toggles: vec![VoiceToggle {
                    flag: VoiceFlag::SelfMute,
                    enabled: true,
                }],
            })
        );
    }

    #[test]
    fn move_wins_over_toggles() {
        let moved_and_deafened = VoiceSnapshot {
            server_deaf: true,
            ..in_channel(2)
        };
        assert_eq!(
            classify_voice(Some(&in_channel(1)), &moved_and_deafened),
            Some(VoiceActivity::Moved { from: 1, to: 2 })
        );
    }

    #[test]
    fn no_delta_means_nothing() {
        assert_eq!(classify_voice(Some(&in_channel(1)), &in_channel(1)), None);
        assert_eq!(classify_voice(None, &VoiceSnapshot::default()), None);
    }
}
