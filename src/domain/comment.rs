//! Comment and reaction payloads (`comments` topic).

use serde::{Deserialize, Serialize};

/// Kind of entity a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentEntityType {
    /// A single event.
    Event,
    /// A series of events.
    Series,
}

/// A comment, delivered for `comment_created` and `comment_removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment ID.
    pub id: String,
    /// Comment text.
    pub body: String,
    /// Kind of the parent entity.
    pub parent_entity_type: ParentEntityType,
    /// ID of the parent entity.
    #[serde(rename = "parentEntityID")]
    pub parent_entity_id: i64,
    /// ID of the comment this one replies to.
    #[serde(rename = "parentCommentID", default)]
    pub parent_comment_id: Option<String>,
    /// Address of the author.
    pub user_address: String,
    /// Address of the user being replied to.
    #[serde(default)]
    pub reply_address: Option<String>,
    /// Creation time as sent by the server.
    pub created_at: String,
    /// Last update time as sent by the server.
    pub updated_at: String,
}

/// A reaction, delivered for `reaction_created` and `reaction_removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Unique reaction ID.
    pub id: String,
    /// ID of the comment reacted to.
    #[serde(rename = "commentID")]
    pub comment_id: i64,
    /// Reaction kind.
    pub reaction_type: String,
    /// Icon representing the reaction.
    pub icon: String,
    /// Address of the reacting user.
    pub user_address: String,
    /// Creation time as sent by the server.
    pub created_at: String,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn comment_uses_id_suffix_keys() {
        let json = serde_json::json!({
            "id": "c1",
            "body": "hello",
            "parentEntityType": "Series",
            "parentEntityID": 7,
            "parentCommentID": null,
            "userAddress": "0xabc",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let Ok(comment) = serde_json::from_value::<Comment>(json) else {
            panic!("comment should decode");
        };
        assert_eq!(comment.parent_entity_type, ParentEntityType::Series);
        assert_eq!(comment.parent_entity_id, 7);
        assert!(comment.parent_comment_id.is_none());
        assert!(comment.reply_address.is_none());
    }

    #[test]
    fn unknown_parent_entity_is_rejected() {
        let json = serde_json::json!({
            "id": "c1", "body": "b", "parentEntityType": "Market",
            "parentEntityID": 1, "userAddress": "0x", "createdAt": "x", "updatedAt": "y"
        });
        assert!(serde_json::from_value::<Comment>(json).is_err());
    }

    #[test]
    fn reaction_decodes() {
        let json = serde_json::json!({
            "id": "r1", "commentID": 12, "reactionType": "HEART",
            "icon": "h", "userAddress": "0xdef", "createdAt": "now"
        });
        let Ok(reaction) = serde_json::from_value::<Reaction>(json) else {
            panic!("reaction should decode");
        };
        assert_eq!(reaction.comment_id, 12);
        assert_eq!(reaction.reaction_type, "HEART");
    }
}
