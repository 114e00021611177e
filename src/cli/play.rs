//! Interactive terminal player
//!
//! Plays a dialogue database in the terminal. This module is the
//! out-of-core collaborator rolled into one place: it implements the output
//! surface, subscribes to the action stream (simulating the minigame
//! interludes and forced transitions) and drives the final-decision flow.

use crate::application::{ActionHandler, GameContext};
use crate::contracts::OutputSurface;
use crate::domain::value_objects::{CharacterId, DialogueAction, GameMode, NodeId};
use crate::infrastructure::loader::parse_database;
use crate::runtime::DialogueRuntime;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(30);

/// Run the player mode over a database JSON source
pub fn run_play(source: &str) -> anyhow::Result<()> {
    let database = Arc::new(parse_database(source)?);
    let mut context = GameContext::new(Arc::clone(&database));

    let decision: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&decision);
    context
        .runtime_mut()
        .register_final_decision_callback(Box::new(move |name| {
            *sink.borrow_mut() = Some(name.to_string());
        }));
    context.register_action_handler(Box::new(ConsoleActionHandler));

    println!("=== kurgu player ===");
    println!();
    println!("Controls:");
    println!("  Enter: continue");
    println!("  1-9:   select choice / character");
    println!("  q:     quit");
    println!();

    loop {
        context.pump();

        if context.runtime().is_active() {
            drive_dialogue(&mut context)?;
            continue;
        }

        if let Some(name) = decision.borrow_mut().take() {
            conclude(&mut context, &name);
            break;
        }

        let names: Vec<(CharacterId, String)> = context
            .runtime()
            .database()
            .characters
            .iter()
            .map(|c| (c.character_id.clone(), c.display_name.clone()))
            .collect();

        println!("--- Who do you want to talk to? ---");
        for (i, (id, display_name)) in names.iter().enumerate() {
            let marker = if is_unavailable(context.runtime(), id) {
                " (unavailable)"
            } else {
                ""
            };
            println!("{}. {}{}", i + 1, display_name, marker);
        }

        let input = get_input("Select:")?;
        if input == "q" {
            println!("Goodbye!");
            break;
        }

        let Ok(index) = input.parse::<usize>() else {
            println!("Enter a number or 'q'.");
            continue;
        };
        let Some((id, display_name)) = names.get(index.wrapping_sub(1)) else {
            println!("No such character.");
            continue;
        };
        if is_unavailable(context.runtime(), id) {
            println!("{display_name} cannot talk right now.");
            continue;
        }

        let surface = Some(Box::new(TerminalSurface::new()) as Box<dyn OutputSurface>);
        if context.runtime_mut().start_dialogue(id, surface).is_err() {
            println!("{display_name} has nothing to say right now.");
        }
    }

    Ok(())
}

/// Step the active session until it closes: type out lines in real time,
/// take continue/choice input, and route actions between steps
fn drive_dialogue(context: &mut GameContext) -> anyhow::Result<()> {
    while context.runtime().is_active() {
        while context.runtime().is_typing() {
            std::thread::sleep(TICK);
            context.runtime_mut().tick(TICK.as_secs_f32());
        }
        context.pump();
        if !context.runtime().is_active() {
            break;
        }

        if context.runtime().is_awaiting_choice() {
            let input = get_input("Select:")?;
            if input == "q" {
                context.runtime_mut().end_dialogue();
            } else if let Ok(index) = input.parse::<usize>() {
                if index >= 1 {
                    context.runtime_mut().select_choice(index - 1);
                }
            } else {
                println!("Enter a choice number or 'q'.");
            }
        } else {
            let input = get_input("")?;
            if input == "q" {
                context.runtime_mut().end_dialogue();
            } else {
                context.runtime_mut().next_line();
            }
        }

        context.pump();
    }
    Ok(())
}

fn conclude(context: &mut GameContext, accused: &str) {
    let verdict = accused.to_lowercase();
    let won = verdict.contains("beatrice");
    let state = context.runtime_mut().state_mut();
    if won {
        state.set_flag("game_won");
        println!();
        println!("You accuse {accused}. The pieces fit; the case is closed.");
    } else {
        state.set_flag("game_lost");
        println!();
        println!("You accuse {accused}. The real culprit walks free.");
    }
    println!("== THE END ==");
}

fn is_unavailable(runtime: &DialogueRuntime, character: &CharacterId) -> bool {
    let flag = match character.as_str() {
        "BesteciRedif" => "besteci_unavailable",
        "SimyaciSimurg" => "simyaci_unavailable",
        _ => return false,
    };
    runtime.state().has_flag(&flag.into())
}

/// Prints lines as the typewriter reveals them
struct TerminalSurface {
    printed: usize,
}

impl TerminalSurface {
    fn new() -> Self {
        Self { printed: 0 }
    }
}

impl OutputSurface for TerminalSurface {
    fn display_line(&mut self, speaker: &CharacterId, _text: &str, _typing_speed: f32) {
        self.printed = 0;
        print!("{speaker}: ");
        let _ = io::stdout().flush();
    }

    fn update_typed_text(&mut self, partial: &str) {
        if let Some(fresh) = partial.get(self.printed..) {
            print!("{fresh}");
            let _ = io::stdout().flush();
        }
        self.printed = partial.len();
    }

    fn on_typing_complete(&mut self) {
        println!();
    }

    fn show_choices(&mut self, choices: &[String]) {
        println!("--- Choice ---");
        for (i, choice) in choices.iter().enumerate() {
            println!("{}. {}", i + 1, choice);
        }
    }

    fn hide_choices(&mut self) {}

    fn hide_dialogue(&mut self) {
        println!();
    }
}

/// Reacts to engine actions the way the game's scene layer would:
/// interludes complete instantly, forced transitions open the next
/// conversation, the finale collects an accusation
struct ConsoleActionHandler;

impl ConsoleActionHandler {
    fn resume_after_interlude(
        &self,
        runtime: &mut DialogueRuntime,
        flag: &str,
        character: &str,
        node: &str,
    ) {
        runtime.state_mut().set_flag(flag);
        runtime.set_game_mode(GameMode::Free);
        let surface = Some(Box::new(TerminalSurface::new()) as Box<dyn OutputSurface>);
        if let Err(err) =
            runtime.force_play_node(&CharacterId::from(character), &NodeId::from(node), surface)
        {
            log::warn!("[Player] Could not resume after interlude: {err}");
        }
    }
}

impl ActionHandler for ConsoleActionHandler {
    fn handle_action(&mut self, action: DialogueAction, runtime: &mut DialogueRuntime) {
        match action {
            DialogueAction::StartMinigameFruitNinja => {
                println!();
                println!("[Fruit flies, the knife blurs. The cook nods, impressed.]");
                println!();
                self.resume_after_interlude(
                    runtime,
                    "fruitninja_completed",
                    "AsciFadime",
                    "ch1_post_minigame",
                );
            }
            DialogueAction::StartMinigameTableClean => {
                println!();
                println!("[One table after another wiped spotless.]");
                println!();
                self.resume_after_interlude(
                    runtime,
                    "tableclean_completed",
                    "Garson",
                    "ch1_post_tableclean",
                );
            }
            DialogueAction::ShowFinalDecision => {
                println!();
                println!("--- Time to name the culprit. ---");
                if let Ok(name) = get_input("Who is guilty?") {
                    runtime.submit_final_decision(&name);
                }
            }
            DialogueAction::EndChapter1 => {
                println!();
                println!("[Evening falls over the salon. Chapter 2 begins.]");
                println!();
            }
            other => {
                if let Some(character) = forced_character(other) {
                    let surface =
                        Some(Box::new(TerminalSurface::new()) as Box<dyn OutputSurface>);
                    if let Err(err) =
                        runtime.start_dialogue(&CharacterId::from(character), surface)
                    {
                        log::warn!("[Player] Forced transition to {character} failed: {err}");
                    }
                }
            }
        }
    }
}

fn forced_character(action: DialogueAction) -> Option<&'static str> {
    match action {
        DialogueAction::ForceCharacterGarson => Some("Garson"),
        DialogueAction::ForceCharacterAsci => Some("AsciFadime"),
        DialogueAction::ForceCharacterTuccar => Some("TuccarAtlas"),
        DialogueAction::ForceCharacterAyca => Some("AycaHanim"),
        DialogueAction::ForceCharacterSimyaci => Some("SimyaciSimurg"),
        DialogueAction::ForceCharacterBesteci => Some("BesteciRedif"),
        DialogueAction::ForceCharacterBeatrice => Some("BeatriceHanim"),
        _ => None,
    }
}

/// Get user input with an optional prompt
fn get_input(prompt: &str) -> io::Result<String> {
    if !prompt.is_empty() {
        print!("{prompt} ");
        io::stdout().flush()?;
    }

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
