//! End-to-end tests driving a live relay over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use chat_relay::message::NAME_PROMPT;
use chat_relay::{ChatServer, Config, Transcript};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

struct TestServer {
    addr: SocketAddr,
    chat: ChatServer,
}

impl TestServer {
    async fn spawn(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let chat = ChatServer::new(&config, Transcript::disabled());
        tokio::spawn(chat.clone().run(listener));
        Self { addr, chat }
    }
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect and consume the banner line
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        assert_eq!(client.recv().await, "Welcome to TCP-Chat!");
        client
    }

    /// Connect, register and return the replayed history
    ///
    /// The backlog is exactly the history as it stands now, so earlier join
    /// notices for the same name are not mistaken for this session's own.
    async fn join(server: &TestServer, name: &str) -> (Self, Vec<String>) {
        let expected = server.chat.history().len();
        let mut client = Self::connect(server.addr).await;
        client.send(name).await;

        let mut backlog = Vec::with_capacity(expected);
        for _ in 0..expected {
            backlog.push(client.recv().await);
        }
        let own = client.recv().await;
        assert!(
            own.ends_with(&format!("[SERVER]: {} joined our chat", name)),
            "expected join notice, got {:?}",
            own
        );
        (client, backlog)
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn try_recv(&mut self) -> Option<String> {
        let line = timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()?;
        Some(line.strip_prefix(NAME_PROMPT).unwrap_or(&line).to_string())
    }

    async fn recv(&mut self) -> String {
        self.try_recv().await.expect("connection closed")
    }

    /// Collect lines up to and including one ending with `suffix`
    async fn recv_until(&mut self, suffix: &str) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await;
            let done = line.ends_with(suffix);
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    async fn assert_silent(&mut self) {
        if let Ok(line) = timeout(QUIET_PERIOD, self.lines.next_line()).await {
            panic!("expected no traffic, got {:?}", line);
        }
    }
}

#[tokio::test]
async fn test_chat_rename_whisper_scenario() {
    let server = TestServer::spawn(Config::default()).await;

    let (mut dave, _) = TestClient::join(&server, "dave").await;
    let (mut alice, _) = TestClient::join(&server, "alice").await;
    dave.recv_until("alice joined our chat").await;

    alice.send("hello").await;
    assert!(dave.recv().await.ends_with("][alice]: hello"));
    assert!(alice.recv().await.ends_with("][alice]: hello"));

    alice.send("-name bob").await;
    assert!(dave.recv().await.ends_with("[SERVER]: alice changed their name to bob"));
    assert!(alice.recv().await.ends_with("[SERVER]: alice changed their name to bob"));

    // Carol is not connected yet
    alice.send("-w carol hi").await;
    assert_eq!(alice.recv().await, "carol is not online or does not exist.");
    dave.assert_silent().await;

    let (mut carol, backlog) = TestClient::join(&server, "carol").await;
    assert!(!backlog.iter().any(|line| line.contains("not online")));
    dave.recv_until("carol joined our chat").await;
    alice.recv_until("carol joined our chat").await;

    alice.send("-w carol hi").await;
    assert!(carol.recv().await.ends_with("][bob] whispers: hi"));
    assert!(alice.recv().await.ends_with("][bob] whispers: hi"));
    dave.assert_silent().await;

    // A later joiner never sees the whisper
    let (_erin, backlog) = TestClient::join(&server, "erin").await;
    assert!(!backlog.iter().any(|line| line.contains("whispers")));
    assert!(backlog.iter().any(|line| line.ends_with("[bob]: hello") || line.ends_with("[alice]: hello")));
}

#[tokio::test]
async fn test_history_replay_order() {
    let server = TestServer::spawn(Config::default()).await;

    let (mut alice, _) = TestClient::join(&server, "alice").await;
    for body in ["one", "two", "three"] {
        alice.send(body).await;
        assert!(alice.recv().await.ends_with(body));
    }

    let (mut bob, backlog) = TestClient::join(&server, "bob").await;
    assert_eq!(backlog.len(), 4);
    assert!(backlog[0].ends_with("[SERVER]: alice joined our chat"));
    assert!(backlog[1].ends_with("[alice]: one"));
    assert!(backlog[2].ends_with("[alice]: two"));
    assert!(backlog[3].ends_with("[alice]: three"));

    alice.send("live").await;
    assert!(bob.recv().await.ends_with("[alice]: live"));
}

#[tokio::test]
async fn test_name_retry_and_capacity() {
    let config = Config {
        max_sessions: 2,
        ..Config::default()
    };
    let server = TestServer::spawn(config).await;

    let (_alice, _) = TestClient::join(&server, "alice").await;

    let mut second = TestClient::connect(server.addr).await;
    second.send("alice").await;
    assert_eq!(
        second.recv().await,
        "Name already taken. Please choose a different name."
    );
    second.send("   ").await;
    assert_eq!(second.recv().await, "Invalid name. Please try again.");
    second.send("bob").await;
    second.recv_until("bob joined our chat").await;

    let mut third = TestClient::connect(server.addr).await;
    third.send("carol").await;
    assert_eq!(third.recv().await, "Server full. Try later.");
    assert_eq!(third.try_recv().await, None);
}

#[tokio::test]
async fn test_departure_notice() {
    let server = TestServer::spawn(Config::default()).await;

    let (mut alice, _) = TestClient::join(&server, "alice").await;
    let (bob, _) = TestClient::join(&server, "bob").await;
    alice.recv_until("bob joined our chat").await;

    drop(bob);
    assert!(alice.recv().await.ends_with("[SERVER]: bob left our chat"));

    // The name is free again
    let (_bob, backlog) = TestClient::join(&server, "bob").await;
    assert!(backlog.last().unwrap().ends_with("bob left our chat"));
}

#[tokio::test]
async fn test_help_and_unknown_command() {
    let server = TestServer::spawn(Config::default()).await;
    let (mut alice, _) = TestClient::join(&server, "alice").await;

    alice.send("-h").await;
    let manual = alice.recv_until("Enjoy chatting!").await;
    assert_eq!(manual[0], "TCP-Chat Manual");

    alice.send("-x").await;
    assert_eq!(alice.recv().await, "-x is not a command. try -h");
}
