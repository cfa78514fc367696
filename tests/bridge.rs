//! Host-framework bridge integration tests

use parley::content::Role;
use parley::llm::StatelessBackend;
use parley::tools::{Tool, advertised_tool};
use parley::{Conversation, Error, HostItem, TurnEvent};
use serde_json::json;

mod common;
use common::{ScriptedChat, add_tool};

fn ask(text: &str) -> HostItem {
    HostItem::Message {
        role: Role::User,
        content: vec![text.to_string()],
    }
}

fn lights_tool() -> Tool {
    advertised_tool(
        "set_lights",
        Some("Switch the lights in a room."),
        &json!({
            "type": "object",
            "properties": {
                "room": {"title": "Room", "type": "string"},
                "level": {"title": "Level", "type": "integer"}
            }
        }),
    )
}

#[tokio::test]
async fn advertised_call_becomes_host_tool_call() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([vec!["TOOL-CALL: set_lights(\"kitchen\", 80)"]]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend);

    let event = conversation
        .respond(&[ask("lights to 80 in the kitchen")], &[lights_tool()])
        .await
        .unwrap()
        .unwrap();

    let TurnEvent::ToolCall {
        call_id,
        name,
        arguments,
    } = event
    else {
        panic!("expected a tool call, got {event:?}");
    };
    assert_eq!(name, "set_lights");
    assert!(call_id.starts_with("call_"));

    let arguments: serde_json::Value = serde_json::from_str(&arguments).unwrap();
    assert_eq!(arguments, json!({"room": "kitchen", "level": 80}));
    assert_eq!(
        conversation.ledger().lookup(&call_id),
        Some("TOOL-CALL: set_lights(\"kitchen\", 80)")
    );
}

#[tokio::test]
async fn host_result_is_replayed_on_the_next_turn() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([
            vec!["TOOL-CALL: set_lights(\"kitchen\", 80)"],
            vec!["The kitchen lights are at 80%."],
        ]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend);
    let first = ask("lights to 80 in the kitchen");

    let Some(TurnEvent::ToolCall { call_id, .. }) = conversation
        .respond(std::slice::from_ref(&first), &[lights_tool()])
        .await
        .unwrap()
    else {
        panic!("expected a tool call");
    };

    let items = vec![
        first,
        HostItem::FunctionCallOutput {
            call_id,
            output: json!({"text": "ok"}).to_string(),
        },
    ];
    let event = conversation.respond(&items, &[lights_tool()]).await.unwrap();
    assert_eq!(
        event,
        Some(TurnEvent::Text("The kitchen lights are at 80%.".into()))
    );

    let requests = conversation.backend().client().requests();
    let replayed: Vec<(&str, &str)> = requests[1]
        .messages
        .iter()
        .skip(1)
        .map(|m| (m.role.as_str(), m.content.as_str()))
        .collect();
    assert_eq!(
        replayed,
        [
            ("user", "lights to 80 in the kitchen"),
            ("assistant", "TOOL-CALL: set_lights(\"kitchen\", 80)"),
            (
                "system",
                "The function result of TOOL-CALL: set_lights(\"kitchen\", 80) is: ok"
            ),
        ]
    );
}

#[tokio::test]
async fn own_tools_run_locally() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([vec!["TOOL-CALL: add(2,3)"], vec!["It is 5."]]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend).with_tools(vec![add_tool()]);

    let event = conversation
        .respond(&[ask("what is 2 plus 3")], &[lights_tool()])
        .await
        .unwrap();
    assert_eq!(event, Some(TurnEvent::Text("It is 5.".into())));
    assert!(conversation.ledger().is_empty());
}

#[tokio::test]
async fn arity_mismatch_is_unknown_tool() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([vec!["TOOL-CALL: set_lights(\"kitchen\")"]]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend);

    let err = conversation
        .respond(&[ask("kitchen lights")], &[lights_tool()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTool { name, .. } if name == "set_lights"));
}

#[tokio::test]
async fn empty_reply_yields_no_event() {
    let backend = StatelessBackend::new(ScriptedChat::new([Vec::<String>::new()]), "test-model");
    let mut conversation = Conversation::new(backend);

    let event = conversation.respond(&[ask("hello?")], &[]).await.unwrap();
    assert_eq!(event, None);
}

#[tokio::test]
async fn multi_segment_prose_is_joined() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([vec!["The kitchen is lit.", "Anything else?"]]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend);

    let event = conversation.respond(&[ask("status")], &[lights_tool()]).await.unwrap();
    assert_eq!(
        event,
        Some(TurnEvent::Text("The kitchen is lit.\nAnything else?".into()))
    );
}

#[tokio::test]
async fn indented_marker_is_not_handed_to_the_host() {
    let backend = StatelessBackend::new(
        ScriptedChat::new([vec!["\n TOOL-CALL: set_lights(\"kitchen\", 80)"]]),
        "test-model",
    );
    let mut conversation = Conversation::new(backend);

    let err = conversation
        .respond(&[ask("lights to 80 in the kitchen")], &[lights_tool()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddedInvocation(_)));
    assert!(conversation.ledger().is_empty());
}
