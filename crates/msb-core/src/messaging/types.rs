use serde::Serialize;

pub const MSGTYPE_TEXT: &str = "m.text";
pub const MSGTYPE_IMAGE: &str = "m.image";
pub const HTML_FORMAT: &str = "org.matrix.custom.html";
pub const REL_REPLACE: &str = "m.replace";

/// Content of an outgoing `m.room.message` event.
///
/// Serializes to exactly the JSON the homeserver expects, so adapters can
/// send it as a raw event body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(TextContent),
    Image(ImageContent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub msgtype: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
    /// Replacement content of an edit.
    #[serde(rename = "m.new_content", skip_serializing_if = "Option::is_none")]
    pub new_content: Option<Box<TextContent>>,
    #[serde(rename = "m.relates_to", skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<Relation>,
}

impl TextContent {
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            msgtype: MSGTYPE_TEXT.to_string(),
            body: body.into(),
            format: None,
            formatted_body: None,
            new_content: None,
            relates_to: None,
        }
    }

    pub fn html(body: impl Into<String>, formatted_body: impl Into<String>) -> Self {
        Self {
            format: Some(HTML_FORMAT.to_string()),
            formatted_body: Some(formatted_body.into()),
            ..Self::plain(body)
        }
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted_body.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub rel_type: String,
    pub event_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageContent {
    pub msgtype: String,
    pub body: String,
    pub url: String,
}

impl ImageContent {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            msgtype: MSGTYPE_IMAGE.to_string(),
            body: body.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_omits_format_fields() {
        let v = serde_json::to_value(MessageContent::Text(TextContent::plain("hi"))).unwrap();
        assert_eq!(v, json!({"msgtype": "m.text", "body": "hi"}));
    }

    #[test]
    fn image_serializes_url() {
        let v = serde_json::to_value(MessageContent::Image(ImageContent::new(
            "mxc://x/y",
            "alt text",
        )))
        .unwrap();
        assert_eq!(
            v,
            json!({"msgtype": "m.image", "body": "alt text", "url": "mxc://x/y"})
        );
    }
}
