use std::cell::RefCell;
use std::rc::Rc;

use collab_client::{ClientError, SharedString, SubscriptionId};
use log::{debug, warn};

use crate::ui::TextControl;

/// Binds the free text string to a [`TextControl`].
///
/// Edits go out as a whole-content replacement. Remote changes overwrite
/// the control; this participant's own echoes are ignored so typing does
/// not reset the caret.
pub struct TextBinding {
    text: SharedString,
    control: Rc<RefCell<dyn TextControl>>,
    subscription: SubscriptionId,
}

impl TextBinding {
    /// Copy the current text into `control` and follow remote changes.
    pub fn attach(text: SharedString, control: Rc<RefCell<dyn TextControl>>) -> Self {
        control.borrow_mut().set_value(&text.get_text());

        let source = text.clone();
        let target = Rc::clone(&control);
        let subscription = text.on_sequence_delta(move |delta| {
            if delta.local {
                return;
            }
            target.borrow_mut().set_value(&source.get_text());
        });
        debug!("text binding attached to {} as {subscription}", text.name());

        Self {
            text,
            control,
            subscription,
        }
    }

    /// Push the control's content into the shared string.
    pub fn on_input(&self) -> Result<(), ClientError> {
        let value = self.control.borrow().value();
        self.text.replace_text(0, self.text.get_length(), &value)
    }

    /// Like [`TextBinding::on_input`], logging instead of returning errors.
    pub fn on_input_logged(&self) {
        if let Err(err) = self.on_input() {
            warn!("dropping text edit: {err}");
        }
    }

    /// Stop following remote changes.
    pub fn detach(self) {
        self.text.off(self.subscription);
    }
}
