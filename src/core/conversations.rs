use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participant_name: String,
    pub last_message: String,
    #[serde(default)]
    pub skill_context: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
}

/// Conversations whose participant, last message or skill title contain
/// `query`, ignoring case. A blank query returns everything.
pub fn filter_conversations<'a>(conversations: &'a [Conversation], query: &str) -> Vec<&'a Conversation> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return conversations.iter().collect();
    }

    conversations
        .iter()
        .filter(|conv| {
            conv.participant_name.to_lowercase().contains(&query)
                || conv.last_message.to_lowercase().contains(&query)
                || conv
                    .skill_context
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(&query))
        })
        .collect()
}

pub fn unread_badge(count: u32) -> Option<String> {
    match count {
        0 => None,
        1..=9 => Some(count.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// Opening a conversation clears its unread counter. Returns false for an
/// unknown id.
pub fn mark_read(conversations: &mut [Conversation], id: &str) -> bool {
    match conversations.iter_mut().find(|conv| conv.id == id) {
        Some(conv) => {
            conv.unread_count = 0;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversations() -> Vec<Conversation> {
        vec![
            Conversation {
                id: "c1".to_string(),
                participant_name: "Sarah Chen".to_string(),
                last_message: "See you Thursday!".to_string(),
                skill_context: Some("React Development Bootcamp".to_string()),
                unread_count: 2,
            },
            Conversation {
                id: "c2".to_string(),
                participant_name: "David Kim".to_string(),
                last_message: "Can we swap for a Spanish session?".to_string(),
                skill_context: None,
                unread_count: 12,
            },
        ]
    }

    #[test]
    fn test_filter_matches_any_field() {
        let convs = conversations();
        assert_eq!(filter_conversations(&convs, "REACT")[0].id, "c1");
        assert_eq!(filter_conversations(&convs, "spanish")[0].id, "c2");
        assert_eq!(filter_conversations(&convs, "kim").len(), 1);
        assert_eq!(filter_conversations(&convs, " ").len(), 2);
        assert!(filter_conversations(&convs, "piano").is_empty());
    }

    #[test]
    fn test_unread_badge() {
        assert_eq!(unread_badge(0), None);
        assert_eq!(unread_badge(3).as_deref(), Some("3"));
        assert_eq!(unread_badge(12).as_deref(), Some("9+"));
    }

    #[test]
    fn test_mark_read() {
        let mut convs = conversations();
        assert!(mark_read(&mut convs, "c2"));
        assert_eq!(convs[1].unread_count, 0);
        assert!(!mark_read(&mut convs, "missing"));
    }
}
