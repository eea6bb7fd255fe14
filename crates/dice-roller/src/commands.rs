use collab_client::LocalService;
use log::{info, warn};
use tokio::signal;
use tokio::task::{self, LocalSet};

use dice_roller::binders::DiceFace;
use dice_roller::config::AppConfig;
use dice_roller::participant::Participant;
use dice_roller::scene::LogRenderer;
use dice_roller::session::SessionAddress;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub struct DemoOptions {
    pub joiners: usize,
    /// `None` renders until interrupted.
    pub frames: Option<u64>,
    pub roll_every: u64,
    pub text: String,
}

/// What one participant does on top of rendering: the originator types
/// `text` one character per frame, and the participants take turns rolling.
struct Script {
    seat: usize,
    seats: usize,
    roll_every: u64,
    typed: Vec<char>,
}

impl Script {
    fn on_frame(&self, participant: &Participant, frame: u64) {
        let typed = usize::try_from(frame - 1)
            .ok()
            .and_then(|i| self.typed.get(i));
        if let Some(c) = typed {
            if let Err(e) = participant.type_text(c.encode_utf8(&mut [0; 4])) {
                warn!("typing failed: {e}");
            }
        }

        if self.rolls_on(frame) {
            let value = participant.roll(&mut rand::thread_rng());
            info!("participant {} rolled {value}", self.seat);
        }
    }

    fn rolls_on(&self, frame: u64) -> bool {
        self.roll_every > 0
            && frame % self.roll_every == 0
            && (frame / self.roll_every) % self.seats as u64 == self.seat as u64
    }
}

// ── demo ────────────────────────────────────────────────────────────

pub async fn demo(config: &AppConfig, url: Option<&str>, options: &DemoOptions) -> CmdResult {
    let address = SessionAddress::parse(url.unwrap_or(&config.session.base_url));
    if let Some(id) = address.fragment() {
        return Err(format!(
            "demo starts its own session and cannot join `{id}`; pass --url without a #fragment"
        )
        .into());
    }
    let service = LocalService::new(config.service.to_service_config());

    let originator =
        Participant::start(&service, &address, config, Box::new(LogRenderer::new())).await?;
    let mut participants = vec![originator];
    for _ in 0..options.joiners {
        let joiner = Participant::start(
            &service,
            participants[0].address(),
            config,
            Box::new(LogRenderer::new()),
        )
        .await?;
        participants.push(joiner);
    }

    println!("Session: {}", participants[0].address());
    println!("  participants: {}", participants.len());
    match options.frames {
        Some(frames) => println!("  frames: {frames}"),
        None => println!("  frames: unbounded (Ctrl-C to stop)"),
    }
    println!();

    let seats = participants.len();
    let local = LocalSet::new();
    let running = local.run_until(async move {
        let handles: Vec<_> = participants
            .into_iter()
            .enumerate()
            .map(|(seat, mut participant)| {
                let script = Script {
                    seat,
                    seats,
                    roll_every: options.roll_every,
                    typed: if seat == 0 {
                        options.text.chars().collect()
                    } else {
                        Vec::new()
                    },
                };
                let frames = options.frames;
                task::spawn_local(async move {
                    participant
                        .run_with(frames, |p, frame| script.on_frame(p, frame))
                        .await;
                    participant
                })
            })
            .collect();

        let mut finished = Vec::with_capacity(handles.len());
        for handle in handles {
            finished.push(handle.await?);
        }
        Ok::<_, task::JoinError>(finished)
    });

    let participants = tokio::select! {
        finished = running => finished?,
        interrupted = signal::ctrl_c() => {
            interrupted?;
            println!("interrupted");
            return Ok(());
        }
    };

    // Let the last round of changes settle.
    for participant in &participants {
        participant.pump();
    }

    println!(
        "  {:<22} {:<6} {:<8} {:<24} {}",
        "participant", "dice", "frames", "rotation (x, y)", "text"
    );
    for participant in &participants {
        let name = format!(
            "{} {}",
            participant.role(),
            participant.session().container().client_id()
        );
        let dice = participant
            .dice_face()
            .map(|f| format!("{} {}", f.glyph, f.value))
            .unwrap_or_else(|| "-".to_string());
        let rotation = participant.cube_rotation();
        println!(
            "  {:<22} {:<6} {:<8} {:<24} {:?}",
            name,
            dice,
            participant.frames_drawn(),
            format!("({:.2}, {:.2})", rotation.x, rotation.y),
            participant.control_text()
        );
    }

    for participant in participants {
        participant.leave();
    }
    Ok(())
}

// ── faces ───────────────────────────────────────────────────────────

pub fn faces() -> CmdResult {
    for face in DiceFace::all() {
        println!("  {}  {}  {}", face.value, face.glyph, face.css_color());
    }
    Ok(())
}
