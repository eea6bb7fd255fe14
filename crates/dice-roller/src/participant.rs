//! One participant: a session with its binders, scene and render loop.

use std::cell::RefCell;
use std::rc::Rc;

use collab_client::{ClientError, LocalService};
use log::{debug, info};
use rand::Rng;
use tokio::time::{self, MissedTickBehavior};

use crate::binders::{DiceBinding, DiceFace, Rotation, RotationField, RotationMirror, TextBinding};
use crate::config::AppConfig;
use crate::render::RenderLoop;
use crate::scene::{Renderer, SceneContext};
use crate::session::{Role, Session, SessionAddress, StartupError};
use crate::ui::{ConsoleDiceView, TextBuffer, TextControl};

/// A running participant with headless views.
pub struct Participant {
    session: Session,
    scene: Rc<RefCell<SceneContext>>,
    dice_view: Rc<RefCell<ConsoleDiceView>>,
    text_control: Rc<RefCell<TextBuffer>>,
    dice: DiceBinding,
    text: TextBinding,
    mirror: Option<RotationMirror>,
    render: RenderLoop<RotationField>,
}

impl Participant {
    /// Bootstrap a session at `address` and wire up every binder.
    pub async fn start(
        service: &LocalService,
        address: &SessionAddress,
        config: &AppConfig,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, StartupError> {
        let session = Session::bootstrap(service, address).await?;
        let role = session.role();
        let label = format!("{} {}", role, session.container().client_id());

        let scene = Rc::new(RefCell::new(SceneContext::new(&config.render, renderer)));
        let dice_view = Rc::new(RefCell::new(ConsoleDiceView::new(label)));
        let text_control = Rc::new(RefCell::new(TextBuffer::new()));

        let dice = DiceBinding::attach(session.dice().clone(), dice_view.clone());
        let text = TextBinding::attach(session.text().clone(), text_control.clone());

        let field = RotationField::new(session.rotation().clone());
        let mirror = match role {
            Role::Joiner => Some(RotationMirror::attach(&field, Rc::clone(&scene))),
            Role::Originator => None,
        };
        let render = RenderLoop::new(
            Rc::clone(&scene),
            field,
            role,
            config.render.rotation_step,
            config.render.frame_interval(),
        );

        Ok(Self {
            session,
            scene,
            dice_view,
            text_control,
            dice,
            text,
            mirror,
            render,
        })
    }

    /// Whether this participant created the session.
    pub fn role(&self) -> Role {
        self.session.role()
    }

    /// Address other participants join with.
    pub fn address(&self) -> &SessionAddress {
        self.session.address()
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one render frame.
    pub fn frame(&mut self) {
        self.render.frame();
    }

    /// Apply every remote change that has arrived.
    pub fn pump(&self) -> usize {
        self.session.container().process_incoming()
    }

    /// Roll the dice.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        self.dice.roll(rng)
    }

    /// Type `text` at the caret of the text control and publish the result.
    pub fn type_text(&self, text: &str) -> Result<(), ClientError> {
        self.text_control.borrow_mut().type_str(text);
        self.text.on_input()
    }

    /// The dice face currently shown.
    pub fn dice_face(&self) -> Option<DiceFace> {
        self.dice_view.borrow().current()
    }

    /// Content of the text control.
    pub fn control_text(&self) -> String {
        self.text_control.borrow().value()
    }

    /// The cube's current rotation.
    pub fn cube_rotation(&self) -> Rotation {
        self.scene.borrow().cube_rotation()
    }

    /// Frames drawn so far, including mirror redraws.
    pub fn frames_drawn(&self) -> u64 {
        self.scene.borrow().frames()
    }

    /// Drive the participant from the event loop: render at the configured
    /// rate and apply remote changes as they arrive. Stops after `frames`
    /// render frames, or never for `None`.
    pub async fn run(&mut self, frames: Option<u64>) {
        self.run_with(frames, |_, _| {}).await;
    }

    /// Like [`Participant::run`], calling `on_frame` with the participant
    /// and the number of frames rendered so far after every frame.
    pub async fn run_with<F>(&mut self, frames: Option<u64>, mut on_frame: F)
    where
        F: FnMut(&Self, u64),
    {
        let mut ticker = time::interval(self.render.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut connected = self.session.container().is_connected();
        let mut rendered = 0u64;

        while frames.map_or(true, |limit| rendered < limit) {
            tokio::select! {
                _ = ticker.tick() => {
                    self.render.frame();
                    rendered += 1;
                    on_frame(self, rendered);
                }
                alive = self.session.container().next_remote(), if connected => {
                    if !alive {
                        info!("{} stopped receiving updates", self.session.container().client_id());
                        connected = false;
                    }
                }
            }
        }
        debug!("{} rendered {rendered} frame(s)", self.session.container().client_id());
    }

    /// Unsubscribe every binder and leave the session.
    pub fn leave(self) {
        let Self {
            session,
            dice,
            text,
            mirror,
            ..
        } = self;
        dice.detach();
        text.detach();
        if let Some(mirror) = mirror {
            mirror.detach();
        }
        session.container().disconnect();
        debug!("participant left {}", session.address());
    }
}
