use system::{
    ClientMessage, ConnectionStatus, DocumentView, EditorBuffer, LocalChange, RemoteApply,
    RoomMetrics, ServerMessage, SyncClient,
};

fn decode(json: &str) -> ServerMessage {
    ServerMessage::from_json(json).expect("valid server event")
}

#[test]
fn it_follows_a_whole_session_from_the_wire() {
    let mut client = SyncClient::from_path("/new-room").expect("");
    let mut editor = EditorBuffer::new("");

    let join = client.on_connected().to_json().expect("");
    assert_eq!(join, r#"{"event":"join-room","data":"new-room"}"#);

    // snapshot of a brand-new room is empty and equal to the local text
    let outcome = client.handle_server_message(
        decode(r#"{"event":"text-update","data":""}"#),
        Some(&mut editor),
    );
    assert_eq!(outcome, Some(RemoteApply::Unchanged));
    client.handle_server_message(
        decode(r#"{"event":"room-metrics","data":{"users":1}}"#),
        Some(&mut editor),
    );
    assert_eq!(client.participant_count(), 1);

    let outcome = client.handle_server_message(
        decode(r#"{"event":"text-update","data":"from a peer"}"#),
        Some(&mut editor),
    );
    assert_eq!(outcome, Some(RemoteApply::Applied));
    assert_eq!(client.on_local_change(editor.text()), LocalChange::Echo);

    let text = editor.edit("from a peer, and me").to_owned();
    let edit = client
        .on_local_change(&text)
        .into_edit()
        .expect("genuine edit is forwarded");
    assert_eq!(
        edit.message.to_json().expect(""),
        r#"{"event":"text-change","data":{"roomId":"new-room","text":"from a peer, and me"}}"#
    );

    client.on_disconnected();
    assert_eq!(client.status(), ConnectionStatus::Offline);
    assert_eq!(editor.text(), "from a peer, and me");

    // reconnect is a fresh session: join again and take whatever the room has now
    assert_eq!(
        client.on_connected(),
        ClientMessage::JoinRoom("new-room".parse().expect(""))
    );
    let outcome = client.handle_server_message(
        decode(r#"{"event":"text-update","data":"server copy"}"#),
        Some(&mut editor),
    );
    assert_eq!(outcome, Some(RemoteApply::Applied));
    assert_eq!(editor.text(), "server copy");
    client.on_room_metrics(RoomMetrics { users: 2 });
    assert_eq!(client.participant_count(), 2);
}

#[test]
fn it_never_sends_back_snapshots_that_arrive_in_a_burst() {
    let mut client = SyncClient::from_path("/abc").expect("");
    let mut editor = EditorBuffer::new("");
    client.on_connected();

    let burst = [
        r#"{"event":"text-update","data":"one"}"#,
        r#"{"event":"text-update","data":"two"}"#,
    ];
    for json in burst.iter() {
        client.handle_server_message(decode(json), Some(&mut editor));
    }

    // the widget reports its swaps only after the burst was processed
    let mut reported = editor.text().to_owned();
    loop {
        match client.on_local_change(&reported) {
            LocalChange::Apply(next) => {
                editor.replace_text(&next);
                reported = next;
            }
            other => {
                assert_eq!(other, LocalChange::Echo);
                break;
            }
        }
    }

    assert_eq!(editor.text(), "two");
    assert_eq!(editor.replacements(), 2);
}
