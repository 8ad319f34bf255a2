//! Integration tests for the trivia server
//!
//! These tests run complete games over real WebSocket connections: the
//! lobby, the session state machine, and the transport all working together.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use server::lobby::Lobby;
use server::manager::GameManager;
use server::network::WsServer;
use server::question::StaticSource;
use shared::{
    round_starting, waiting_for_players, AnnouncementParams, AnswersParams, Question,
    QuestionParams, Request, Response, MESSAGE_CORRECT_MOVING_TO_NEXT_ROUND,
    MESSAGE_YOU_ARE_ELIMINATED, MESSAGE_YOU_ARE_THE_WINNER, METHOD_ANNOUNCEMENT, METHOD_ANSWERS,
    METHOD_ASK_QUESTION,
};

const ROUND_DURATION: Duration = Duration::from_millis(1500);
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn abcd_question(prompt: &str, answer: &str) -> Question {
    Question::new(
        prompt,
        vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ],
        answer,
    )
}

/// Boots a full server (listener + manager loop) on an ephemeral port.
async fn start_server(quorum: usize, questions: Vec<Question>) -> (String, Arc<GameManager>) {
    let lobby = Arc::new(Lobby::new(quorum));
    let source = Arc::new(StaticSource::new(questions));
    let manager = Arc::new(GameManager::new(lobby, source, ROUND_DURATION));

    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            let _ = server.run(manager).await;
        });
    }
    {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run().await });
    }

    (format!("ws://{}", addr), manager)
}

/// One player's side of the wire.
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("failed to connect");
        Self { ws }
    }

    /// Next request frame, or `None` once the server closes the connection.
    async fn next_request(&mut self) -> Option<Request> {
        loop {
            let message = timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("server went silent")?;
            match message {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).expect("unparseable frame"))
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Skips announcements until the next `ask_question` arrives.
    async fn wait_for_question(&mut self) -> (u64, QuestionParams) {
        loop {
            let request = self
                .next_request()
                .await
                .expect("connection closed before a question arrived");
            if request.method == METHOD_ASK_QUESTION {
                let params = request.params_as().unwrap();
                return (request.id, params);
            }
        }
    }

    async fn answer(&mut self, request_id: u64, choice: &str) {
        let response = Response::answer(request_id, choice);
        let text = serde_json::to_string(&response).unwrap();
        self.ws.send(Message::Text(text)).await.unwrap();
    }

    async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string())).await.unwrap();
    }

    /// Reads everything until the server closes the connection.
    async fn collect_until_close(&mut self) -> Vec<Request> {
        let mut requests = Vec::new();
        while let Some(request) = self.next_request().await {
            requests.push(request);
        }
        requests
    }
}

fn announcements(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|r| r.method == METHOD_ANNOUNCEMENT)
        .map(|r| r.params_as::<AnnouncementParams>().unwrap().message)
        .collect()
}

fn reveals(requests: &[Request]) -> Vec<AnswersParams> {
    requests
        .iter()
        .filter(|r| r.method == METHOD_ANSWERS)
        .map(|r| r.params_as::<AnswersParams>().unwrap())
        .collect()
}

/// FULL GAME TESTS
mod game_tests {
    use super::*;

    #[tokio::test]
    async fn one_round_game_with_winner() {
        let (url, _manager) = start_server(2, vec![abcd_question("q1", "C")]).await;

        let mut p1 = TestClient::connect(&url).await;
        // The lone waiting player is told one more is needed
        let first = p1.next_request().await.unwrap();
        assert_eq!(first.method, METHOD_ANNOUNCEMENT);
        assert_eq!(
            first.params_as::<AnnouncementParams>().unwrap().message,
            waiting_for_players(1)
        );

        let mut p2 = TestClient::connect(&url).await;

        let (id1, question) = p1.wait_for_question().await;
        assert_eq!(question.question, "q1");
        assert_eq!(question.choices, vec!["A", "B", "C", "D"]);
        let (id2, _) = p2.wait_for_question().await;

        p1.answer(id1, "C").await;
        p2.answer(id2, "D").await;

        let log1 = p1.collect_until_close().await;
        let log2 = p2.collect_until_close().await;

        // Both see the same reveal
        let reveal1 = &reveals(&log1)[0];
        assert_eq!(reveal1.question.answer, "C");
        assert_eq!(reveal1.choice_counts, vec![0, 0, 1, 1]);
        assert_eq!(reveals(&log2)[0].choice_counts, vec![0, 0, 1, 1]);

        assert_eq!(
            announcements(&log1).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );
        assert_eq!(
            announcements(&log2).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );
    }

    #[tokio::test]
    async fn all_correct_round_continues_to_a_second_round() {
        let (url, _manager) =
            start_server(2, vec![abcd_question("q1", "C"), abcd_question("q2", "A")]).await;

        let mut p1 = TestClient::connect(&url).await;
        let mut p2 = TestClient::connect(&url).await;

        let (id1, _) = p1.wait_for_question().await;
        let (id2, _) = p2.wait_for_question().await;
        p1.answer(id1, "C").await;
        p2.answer(id2, "C").await;

        // Round 2 happens: no winner while two players remain
        let (id1, question) = p1.wait_for_question().await;
        assert_eq!(question.question, "q2");
        let (id2, _) = p2.wait_for_question().await;
        p1.answer(id1, "A").await;
        p2.answer(id2, "B").await;

        let log1 = p1.collect_until_close().await;
        let log2 = p2.collect_until_close().await;

        let all1 = announcements(&log1);
        assert!(all1.contains(&MESSAGE_CORRECT_MOVING_TO_NEXT_ROUND.to_string()));
        assert_eq!(all1.last().unwrap(), MESSAGE_YOU_ARE_THE_WINNER);
        assert_eq!(
            announcements(&log2).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );
    }

    #[tokio::test]
    async fn silent_player_is_eliminated_at_the_deadline() {
        let (url, _manager) = start_server(2, vec![abcd_question("q1", "C")]).await;

        let mut p1 = TestClient::connect(&url).await;
        let mut p2 = TestClient::connect(&url).await;

        let (id1, _) = p1.wait_for_question().await;
        let (_id2, _) = p2.wait_for_question().await;
        p1.answer(id1, "C").await;
        // p2 says nothing at all

        let log1 = p1.collect_until_close().await;
        let log2 = p2.collect_until_close().await;

        // The timeout shows up as a no-answer: only p1's choice was counted
        assert_eq!(reveals(&log1)[0].choice_counts, vec![0, 0, 1, 0]);
        assert_eq!(
            announcements(&log1).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );
        assert_eq!(
            announcements(&log2).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );
    }

    #[tokio::test]
    async fn disconnect_mid_round_does_not_stall_the_game() {
        let (url, _manager) = start_server(2, vec![abcd_question("q1", "C")]).await;

        let mut p1 = TestClient::connect(&url).await;
        let mut p2 = TestClient::connect(&url).await;

        let (id1, _) = p1.wait_for_question().await;
        let _ = p2.wait_for_question().await;

        // p2 walks away mid-collection
        p2.ws.close(None).await.unwrap();
        p1.answer(id1, "C").await;

        let log1 = p1.collect_until_close().await;
        assert_eq!(reveals(&log1)[0].choice_counts, vec![0, 0, 1, 0]);
        assert_eq!(
            announcements(&log1).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );
    }

    #[tokio::test]
    async fn everyone_wrong_means_no_winner() {
        let (url, _manager) = start_server(3, vec![abcd_question("q1", "C")]).await;

        let mut clients = Vec::new();
        for _ in 0..3 {
            clients.push(TestClient::connect(&url).await);
        }

        let wrong = ["A", "B", "D"];
        let mut ids = Vec::new();
        for client in clients.iter_mut() {
            let (id, _) = client.wait_for_question().await;
            ids.push(id);
        }
        for (client, choice) in clients.iter_mut().zip(wrong) {
            let id = ids.remove(0);
            client.answer(id, choice).await;
        }

        for client in clients.iter_mut() {
            let log = client.collect_until_close().await;
            assert_eq!(reveals(&log)[0].choice_counts, vec![1, 1, 0, 1]);
            let all = announcements(&log);
            assert_eq!(all.last().unwrap(), MESSAGE_YOU_ARE_ELIMINATED);
            assert!(!all.contains(&MESSAGE_YOU_ARE_THE_WINNER.to_string()));
        }
    }
}

/// PROTOCOL ROBUSTNESS TESTS
mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn malformed_messages_count_as_no_answer() {
        let (url, _manager) = start_server(2, vec![abcd_question("q1", "C")]).await;

        let mut p1 = TestClient::connect(&url).await;
        let mut p2 = TestClient::connect(&url).await;

        let (id1, _) = p1.wait_for_question().await;
        let _ = p2.wait_for_question().await;

        p1.answer(id1, "C").await;
        // Nothing p2 sends here is a recognizable answer
        p2.send_raw("this is not json").await;
        p2.send_raw(r#"{"result": 17}"#).await;
        p2.send_raw(r#"{"id": 1, "error": "confused", "result": null}"#)
            .await;

        let log1 = p1.collect_until_close().await;
        let log2 = p2.collect_until_close().await;

        assert_eq!(reveals(&log1)[0].choice_counts, vec![0, 0, 1, 0]);
        assert_eq!(
            announcements(&log2).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );
    }

    #[tokio::test]
    async fn round_announcement_precedes_the_question() {
        let (url, _manager) = start_server(1, vec![abcd_question("q1", "C")]).await;

        let mut p1 = TestClient::connect(&url).await;

        // Single-player quorum: the game starts immediately
        let first = p1.next_request().await.unwrap();
        assert_eq!(first.method, METHOD_ANNOUNCEMENT);
        assert_eq!(
            first.params_as::<AnnouncementParams>().unwrap().message,
            round_starting(1)
        );

        let (id, _) = p1.wait_for_question().await;
        p1.answer(id, "C").await;

        let log = p1.collect_until_close().await;
        assert_eq!(
            announcements(&log).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );
    }
}

/// CONCURRENT SESSION TESTS
mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn two_games_run_independently() {
        let (url, manager) = start_server(2, vec![abcd_question("q1", "C")]).await;

        // First pair seated before the second connects, so the batches are
        // deterministic
        let mut p1 = TestClient::connect(&url).await;
        let mut p2 = TestClient::connect(&url).await;
        let (id1, _) = p1.wait_for_question().await;
        let (id2, _) = p2.wait_for_question().await;

        let mut p3 = TestClient::connect(&url).await;
        let mut p4 = TestClient::connect(&url).await;
        let (id3, _) = p3.wait_for_question().await;
        let (id4, _) = p4.wait_for_question().await;

        // Game 2 finishes while game 1 is still collecting
        p3.answer(id3, "C").await;
        p4.answer(id4, "D").await;
        let log3 = p3.collect_until_close().await;
        let log4 = p4.collect_until_close().await;
        assert_eq!(
            announcements(&log3).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );
        assert_eq!(
            announcements(&log4).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );

        // Game 1 is unaffected
        p1.answer(id1, "D").await;
        p2.answer(id2, "C").await;
        let log1 = p1.collect_until_close().await;
        let log2 = p2.collect_until_close().await;
        assert_eq!(
            announcements(&log1).last().unwrap(),
            MESSAGE_YOU_ARE_ELIMINATED
        );
        assert_eq!(
            announcements(&log2).last().unwrap(),
            MESSAGE_YOU_ARE_THE_WINNER
        );

        assert_eq!(manager.lobby().waiting_count().await, 0);
    }
}
