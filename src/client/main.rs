/**
 * Trivia Terminal Client - Main Entry Point
 *
 * Plays one quiz in the terminal. Usage:
 *
 *   trivia-play [DIFFICULTY] [COUNT] [CATEGORY]
 *
 * The server URL and store path come from TRIVIA_CONFIG / TRIVIA_SERVER_URL /
 * TRIVIA_STORAGE_PATH. TRIVIA_TOKEN, if set, is stored as the session token.
 */
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use trivia_offline::client::config::Config;
use trivia_offline::client::connectivity::ConnectivityEvent;
use trivia_offline::client::game::{GamePhase, GameSettings};
use trivia_offline::client::TriviaClient;
use trivia_offline::shared::{Difficulty, Question};

const DEFAULT_QUESTION_COUNT: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = settings_from_args(std::env::args().skip(1))?;
    let client = TriviaClient::open(Config::from_env()?).await?;

    if let Ok(token) = std::env::var("TRIVIA_TOKEN") {
        client.sessions.set_token(&token).await?;
    }

    let _background = client.start_background();
    spawn_notices(&client);

    let mut game = client.game();
    let session = match game.start_game(settings).await {
        Ok(session) => session,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    println!(
        "{} quiz, {} question(s){}",
        session.settings.difficulty,
        session.total_questions(),
        if client.connectivity.is_offline() {
            " (offline)"
        } else {
            ""
        }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match game.phase() {
            GamePhase::InProgress => {
                let Some(question) = game
                    .session()
                    .and_then(|session| session.current_question())
                    .cloned()
                else {
                    break;
                };
                print_question(&question);

                let Some(line) = lines.next_line().await? else {
                    println!("Bye.");
                    return Ok(());
                };
                let Some(answer) = pick_answer(&question, &line) else {
                    println!("Pick 1-{}.", question.answers.len());
                    continue;
                };

                match game.submit_answer(&answer).await {
                    Ok(feedback) => {
                        if feedback.is_correct {
                            println!("Correct! +{} XP", feedback.xp_gained);
                        } else {
                            println!(
                                "Wrong. The answer was {}.",
                                feedback.correct_answer.as_deref().unwrap_or("not revealed")
                            );
                        }
                        if !feedback.explanation.is_empty() {
                            println!("{}", feedback.explanation);
                        }
                    }
                    Err(e) => println!("Failed to submit answer: {}", e),
                }
            }
            GamePhase::Feedback(_) => {
                game.next_question().await?;
            }
            GamePhase::Results(results) => {
                println!();
                println!("Score: {}/{}", results.score, results.total);
                println!("+{} XP", results.xp_gained);
                match &results.progress {
                    Some(progress) => println!("{}", progress.summary()),
                    None => println!("Log in to track your progress and compete on the leaderboard!"),
                }
                if let Some(notice) = results.offline_notice {
                    println!("{}", notice);
                }
                break;
            }
            GamePhase::Setup => break,
        }
    }

    Ok(())
}

fn settings_from_args(
    mut args: impl Iterator<Item = String>,
) -> Result<GameSettings, Box<dyn std::error::Error>> {
    let difficulty = match args.next() {
        Some(raw) => raw.parse::<Difficulty>()?,
        None => Difficulty::Beginner,
    };
    let count = match args.next() {
        Some(raw) => raw.parse::<usize>()?,
        None => DEFAULT_QUESTION_COUNT,
    };
    let settings = GameSettings::new(difficulty, count);
    Ok(match args.next() {
        Some(category) => settings.with_category(category),
        None => settings,
    })
}

fn print_question(question: &Question) {
    println!();
    println!("[{}] {}", question.category, question.text);
    for (i, answer) in question.answers.iter().enumerate() {
        println!("  {}. {}", i + 1, answer);
    }
}

fn pick_answer(question: &Question, line: &str) -> Option<String> {
    let choice = line.trim().parse::<usize>().ok()?;
    question.answers.get(choice.checked_sub(1)?).cloned()
}

fn spawn_notices(client: &TriviaClient) {
    let mut events = client.connectivity.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ConnectivityEvent::BecameOffline => {
                    println!("\n** You are offline. Answers are graded locally and synced later. **")
                }
                ConnectivityEvent::BecameOnline => println!("\n** You're back online! **"),
                ConnectivityEvent::HealthConfirmed => {}
            }
        }
    });

    let mut reports = client.coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(report) = reports.recv().await {
            println!(
                "\n** Synced {} offline answer(s): {} XP total{} **",
                report.pushed.questions_answered,
                report.totals.xp,
                if report.did_level_up { ", level up!" } else { "" }
            );
        }
    });
}
