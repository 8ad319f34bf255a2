use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use shared::{
    AnnouncementParams, AnswersParams, QuestionParams, Request, Response, METHOD_ANNOUNCEMENT,
    METHOD_ANSWERS, METHOD_ASK_QUESTION,
};

// Prints a server request in a playable form
fn print_request(request: &Request) {
    match request.method.as_str() {
        METHOD_ANNOUNCEMENT => {
            if let Ok(params) = request.params_as::<AnnouncementParams>() {
                println!(">> {}", params.message);
            }
        }
        METHOD_ASK_QUESTION => {
            if let Ok(params) = request.params_as::<QuestionParams>() {
                println!("\nQuestion: {}", params.question);
                for (i, choice) in params.choices.iter().enumerate() {
                    println!("  {}. {}", i + 1, choice);
                }
                println!("Type your answer exactly as listed and press enter:");
            }
        }
        METHOD_ANSWERS => {
            if let Ok(params) = request.params_as::<AnswersParams>() {
                println!("Correct answer: {}", params.question.answer);
                for (choice, count) in params.question.choices.iter().zip(&params.choice_counts) {
                    println!("  {} -> {} vote(s)", choice, count);
                }
            }
        }
        other => println!("Unknown method from server: {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:9999".to_string());

    println!("Connecting to {}", url);
    let (ws, _) = connect_async(url.as_str()).await?;
    println!("Connected. Waiting for a game...");

    let (mut sink, mut source) = ws.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_request_id: u64 = 0;

    loop {
        tokio::select! {
            message = source.next() => {
                let Some(message) = message else { break };
                match message? {
                    Message::Text(text) => match serde_json::from_str::<Request>(&text) {
                        Ok(request) => {
                            last_request_id = request.id;
                            print_request(&request);
                        }
                        Err(e) => println!("Unreadable message from server: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(answer) => {
                        let response = Response::answer(last_request_id, answer.trim());
                        let text = serde_json::to_string(&response)?;
                        sink.send(Message::Text(text)).await?;
                    }
                    None => break,
                }
            }
        }
    }

    println!("Connection closed");
    Ok(())
}
