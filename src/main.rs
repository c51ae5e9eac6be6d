//! Molecule Match entry point
//!
//! Wires the game controller to the browser (DOM, timers, fetch, viewers) on
//! wasm. Natively it plays a short headless session for smoke testing.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlInputElement};

    use molecule_match::assets::{HttpSource, MoleculeCache, load_game_data};
    use molecule_match::consts::OPTION_COUNT;
    use molecule_match::persistence::LocalStore;
    use molecule_match::ranking::{Ranking, format_date};
    use molecule_match::renderer::web::{WebRenderer, library_available, paint_sketch};
    use molecule_match::renderer::{FlatRenderer, Renderer, RendererKind};
    use molecule_match::settings::Settings;
    use molecule_match::sim::{
        Effect, Game, GameEvent, GameSetup, Hud, RoundId, RoundView, Screen, SessionSummary,
    };
    use molecule_match::stage::Stage;

    /// Browser host holding all state
    struct App {
        game: Game,
        stage: Stage<Box<dyn Renderer>>,
        store: LocalStore,
        /// Live `setTimeout` handles by ticket id
        timeouts: HashMap<u64, (RoundId, i32)>,
    }

    type Shared = Rc<RefCell<App>>;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = element(id) {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
        }
    }

    fn option_button(index: usize) -> Option<Element> {
        element(&format!("option-btn-{index}"))
    }

    fn set_option_enabled(index: usize, enabled: bool) {
        if let Some(btn) = option_button(index) {
            let _ = if enabled {
                btn.remove_attribute("disabled")
            } else {
                btn.set_attribute("disabled", "")
            };
        }
    }

    /// Feed an event to the game and apply what comes back
    fn dispatch(app: &Shared, cache: &Rc<MoleculeCache>, event: GameEvent) {
        let now = js_sys::Date::now();
        let effects = app.borrow_mut().game.handle(event, now);
        for effect in effects {
            apply(app, cache, effect);
        }
    }

    fn apply(app: &Shared, cache: &Rc<MoleculeCache>, effect: Effect) {
        match effect {
            Effect::ShowScreen(screen) => show_screen(screen),
            Effect::PresentRound(view) => present_round(app, cache, view),
            Effect::Hud(hud) => update_hud(&hud),
            Effect::MarkCorrect(index) => {
                if let Some(btn) = option_button(index) {
                    let _ = btn.class_list().add_1("correct");
                }
            }
            Effect::MarkWrong(index) => {
                if let Some(btn) = option_button(index) {
                    let _ = btn.class_list().add_1("wrong");
                }
                set_option_enabled(index, false);
            }
            Effect::Reenable(index) => {
                if let Some(btn) = option_button(index) {
                    let _ = btn.class_list().remove_1("wrong");
                }
                set_option_enabled(index, true);
            }
            Effect::LockOptions => {
                for i in 0..OPTION_COUNT {
                    set_option_enabled(i, false);
                }
            }
            Effect::Schedule { ticket, delay_ms } => {
                let Some(window) = web_sys::window() else {
                    return;
                };
                let fire_app = app.clone();
                let fire_cache = cache.clone();
                let callback = Closure::once_into_js(move || {
                    fire_app.borrow_mut().timeouts.remove(&ticket.id);
                    dispatch(&fire_app, &fire_cache, GameEvent::TimerFired(ticket));
                });
                match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    delay_ms as i32,
                ) {
                    Ok(handle) => {
                        app.borrow_mut()
                            .timeouts
                            .insert(ticket.id, (ticket.round, handle));
                    }
                    Err(e) => log::warn!("setTimeout failed: {:?}", e),
                }
            }
            Effect::CancelTimers(round) => {
                let Some(window) = web_sys::window() else {
                    return;
                };
                app.borrow_mut().timeouts.retain(|_, (r, handle)| {
                    if *r == round {
                        window.clear_timeout_with_handle(*handle);
                        false
                    } else {
                        true
                    }
                });
            }
            Effect::Notice(message) => {
                set_text("notice", &message);
                set_hidden("notice", false);
            }
            Effect::SessionEnded(summary) => {
                let mut a = app.borrow_mut();
                a.stage.clear();
                let App { game, store, .. } = &mut *a;
                game.ranking().save(store);
                show_summary(&summary);
                render_ranking(game.ranking());
            }
        }
    }

    fn show_screen(screen: Screen) {
        for s in [Screen::Welcome, Screen::Game, Screen::Summary] {
            set_hidden(&format!("screen-{}", s.as_str()), s != screen);
        }
        set_hidden("notice", true);
    }

    fn present_round(app: &Shared, cache: &Rc<MoleculeCache>, view: RoundView) {
        set_hidden("notice", true);
        for (i, name) in view.names.iter().enumerate() {
            set_text(&format!("option-label-{i}"), name);
            if let Some(btn) = option_button(i) {
                let _ = btn.class_list().remove_2("correct", "wrong");
            }
            set_option_enabled(i, true);
        }
        if let Some(level) = view.level {
            set_text("level", &(level + 1).to_string());
        }

        app.borrow_mut().stage.begin_round(&view);

        // One fetch per slot; they may finish in any order
        for request in view.slots {
            let app = app.clone();
            let cache = cache.clone();
            let round = view.round;
            wasm_bindgen_futures::spawn_local(async move {
                let text = cache.load(&HttpSource, &request.path).await;
                app.borrow_mut()
                    .stage
                    .slot_loaded(round, &request.slot, &text);
            });
        }
    }

    fn update_hud(hud: &Hud) {
        set_text("score", &hud.score.to_string());
        set_text("attempts", &hud.attempts.to_string());
        set_text("accuracy", &format!("{:.0}%", hud.accuracy));
        set_text("time", &hud.remaining_label());
    }

    fn show_summary(summary: &SessionSummary) {
        let entry = &summary.entry;
        set_text("final-player", &entry.player);
        set_text("final-score", &entry.score.to_string());
        set_text("final-attempts", &entry.attempts.to_string());
        set_text("final-accuracy", &format!("{:.1}%", entry.accuracy));
        match summary.rank {
            Some(rank) => set_text("final-rank", &format!("#{rank}")),
            None => set_text("final-rank", "-"),
        }
    }

    fn render_ranking(ranking: &Ranking) {
        let (Some(document), Some(list)) = (document(), element("ranking-list")) else {
            return;
        };
        list.set_inner_html("");
        set_hidden("ranking-empty", !ranking.is_empty());

        let now = js_sys::Date::now();
        for (i, entry) in ranking.entries.iter().enumerate() {
            let Ok(item) = document.create_element("li") else {
                continue;
            };
            item.set_text_content(Some(&format!(
                "{}. {} - {}/{} ({:.1}%) {:.0}s - {}",
                i + 1,
                entry.player,
                entry.score,
                entry.attempts,
                entry.accuracy,
                entry.elapsed_secs,
                format_date(now, entry.timestamp)
            )));
            let _ = list.append_child(&item);
        }
    }

    fn name_input() -> Option<HtmlInputElement> {
        element("name-input")?.dyn_into().ok()
    }

    fn setup_welcome(app: Shared, cache: Rc<MoleculeCache>) {
        let submit = {
            let app = app.clone();
            let cache = cache.clone();
            move || {
                let name = name_input().map(|i| i.value()).unwrap_or_default();
                dispatch(&app, &cache, GameEvent::SubmitName(name));
            }
        };

        if let Some(btn) = element("start-btn") {
            let submit = submit.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                submit();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(input) = element("name-input") {
            let closure =
                Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                    if event.key() == "Enter" {
                        submit();
                    }
                });
            let _ =
                input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_options(app: Shared, cache: Rc<MoleculeCache>) {
        for i in 0..OPTION_COUNT {
            let Some(btn) = option_button(i) else {
                log::warn!("Missing option button {i}");
                continue;
            };
            let app = app.clone();
            let cache = cache.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                dispatch(&app, &cache, GameEvent::SelectOption(i));
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_play_again(app: Shared, cache: Rc<MoleculeCache>) {
        if let Some(btn) = element("play-again-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                dispatch(&app, &cache, GameEvent::PlayAgain);
                if let Some(input) = name_input() {
                    input.set_value("");
                    let _ = input.focus();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn start_ticking(app: Shared, cache: Rc<MoleculeCache>, interval_ms: u32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::new(move || {
            dispatch(&app, &cache, GameEvent::Tick);
        });
        if let Err(e) = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            interval_ms as i32,
        ) {
            log::error!("setInterval failed: {:?}", e);
        }
        closure.forget();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Molecule Match starting...");

        let mut store = LocalStore::open();
        let settings = Settings::load(&store);
        // Stored copy always carries every field, including ones added since
        settings.save(&mut store);
        let ranking = Ranking::load(&store);

        let (levels, catalog) = load_game_data(&HttpSource, &settings).await;

        // Viewer backend is chosen once
        let renderer: Box<dyn Renderer> = if settings.wants_3d(library_available()) {
            Box::new(WebRenderer::new())
        } else {
            Box::new(FlatRenderer::with_painter(paint_sketch))
        };
        let flat = renderer.kind() == RendererKind::Flat;
        log::info!("Using {} viewers", if flat { "2D" } else { "3D" });
        if let Some(body) = document().and_then(|d| d.body()) {
            let _ = body.class_list().toggle_with_force("flat-viewers", flat);
        }

        let seed = js_sys::Date::now() as u64;
        let stage = Stage::new(renderer, &settings);
        let game = Game::new(GameSetup {
            settings,
            levels,
            catalog,
            ranking,
            seed,
        });
        log::info!("Game initialized with seed: {}", seed);
        let tick_interval = game.settings().tick_interval_ms;

        render_ranking(game.ranking());

        let app = Rc::new(RefCell::new(App {
            game,
            stage,
            store,
            timeouts: HashMap::new(),
        }));
        let cache = Rc::new(MoleculeCache::new());

        setup_welcome(app.clone(), cache.clone());
        setup_options(app.clone(), cache.clone());
        setup_play_again(app.clone(), cache.clone());
        start_ticking(app, cache, tick_interval);

        set_hidden("loading", true);
        show_screen(Screen::Welcome);

        log::info!("Molecule Match running!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Molecule Match (native) starting...");
    log::info!("The game runs in the browser - build for wasm32 and serve with `trunk serve`");

    headless::run_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Plays one scripted session against in-memory assets
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use molecule_match::assets::{MemorySource, MoleculeCache, load_game_data};
    use molecule_match::molecule::FALLBACK_MOL2;
    use molecule_match::persistence::MemoryStore;
    use molecule_match::platform::{Clock, ManualClock, time_seed};
    use molecule_match::ranking::Ranking;
    use molecule_match::renderer::FlatRenderer;
    use molecule_match::settings::Settings;
    use molecule_match::sim::{Effect, Game, GameEvent, GameSetup, TimerTicket};
    use molecule_match::stage::Stage;

    const MOLECULES: [&str; 4] = [
        "data/DB/methane.mol2",
        "data/DB/methane-d1.mol2",
        "data/DB/methane-d2.mol2",
        "data/DB/methane-d3.mol2",
    ];

    pub fn run_demo() {
        let settings = Settings::default();
        let catalog_json = serde_json::to_string(&MOLECULES).unwrap_or_default();
        let mut source = MemorySource::new().with(&settings.catalog_url, &catalog_json);
        for path in MOLECULES {
            source.insert(path, FALLBACK_MOL2);
        }

        let mut store = MemoryStore::new();
        let (levels, catalog) = pollster::block_on(load_game_data(&source, &settings));
        let clock = ManualClock::new(1_700_000_000_000.0);
        settings.save(&mut store);

        let mut stage = Stage::new(FlatRenderer::new(), &settings);
        let cache = MoleculeCache::new();
        let mut game = Game::new(GameSetup {
            settings,
            levels,
            catalog,
            ranking: Ranking::load(&store),
            seed: time_seed(&clock),
        });

        let tick = game.settings().tick_interval_ms as f64;
        let mut pending: Vec<(f64, TimerTicket)> = Vec::new();
        let mut effects = game.handle(GameEvent::SubmitName("demo".into()), clock.now_ms());
        let mut ended = false;
        let mut picks = 0u32;

        while !ended {
            for effect in effects.drain(..) {
                match effect {
                    Effect::PresentRound(view) => {
                        pollster::block_on(stage.load_round(&view, &cache, &source));
                    }
                    Effect::Schedule { ticket, delay_ms } => {
                        pending.push((clock.now_ms() + delay_ms as f64, ticket));
                    }
                    Effect::CancelTimers(round) => pending.retain(|(_, t)| t.round != round),
                    Effect::SessionEnded(summary) => {
                        let e = &summary.entry;
                        log::info!(
                            "Demo finished: {} correct of {} ({:.1}%), rank {:?}",
                            e.score,
                            e.attempts,
                            e.accuracy,
                            summary.rank
                        );
                        ended = true;
                    }
                    Effect::Notice(message) => log::warn!("{message}"),
                    _ => {}
                }
            }
            if ended {
                break;
            }

            clock.advance(tick);
            let now = clock.now_ms();

            if let Some(pos) = pending.iter().position(|(due, _)| *due <= now) {
                let (_, ticket) = pending.remove(pos);
                effects = game.handle(GameEvent::TimerFired(ticket), now);
                continue;
            }

            // Every third pick is a deliberate miss
            let choice = game.round().filter(|r| !r.solved).map(|r| {
                picks += 1;
                if picks % 3 == 0 {
                    (r.correct_index + 1) % r.options.len()
                } else {
                    r.correct_index
                }
            });
            effects = match choice {
                Some(index) => game.handle(GameEvent::SelectOption(index), now),
                None => game.handle(GameEvent::Tick, now),
            };
        }

        game.ranking().save(&mut store);
        println!(
            "✓ Headless session complete ({} ranking entries, {} molecules cached)",
            Ranking::load(&store).len(),
            cache.len()
        );
    }
}
