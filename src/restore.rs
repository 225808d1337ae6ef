use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::FormVaultError;
use crate::form::{FormDocument, LiveForm};
use crate::schema::Snapshot;

/// The notifications a live field emits after a programmatic value
/// assignment, so reactive UI bound to it observes the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Input,
    Change,
}

/// On-apply notification capability supplied by the host. Called once per
/// [`ChangeKind`] for every element touched during a restore.
pub trait ChangeNotifier {
    fn notify(&self, key: &str, kind: ChangeKind);
}

/// Notifier for hosts with no reactive listeners (tests, headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn notify(&self, _key: &str, _kind: ChangeKind) {}
}

/// Outcome of a restoration, for user feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Whether a live form could be located for the identity.
    pub found: bool,
    /// Count of elements touched, not of snapshot keys.
    pub updated: usize,
    /// The snapshot's display name.
    pub name: String,
}

/// Re-applies a snapshot's values onto the live document.
pub struct RestoreEngine<N: ChangeNotifier = NullNotifier> {
    notifier: N,
}

impl RestoreEngine<NullNotifier> {
    pub fn new() -> Self {
        Self {
            notifier: NullNotifier,
        }
    }
}

impl Default for RestoreEngine<NullNotifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ChangeNotifier> RestoreEngine<N> {
    pub fn with_notifier(notifier: N) -> Self {
        Self { notifier }
    }

    /// Restore `snapshot` onto the form resolved from `identity`.
    ///
    /// Fail-soft throughout: a missing live form yields
    /// `{found: false, updated: 0}` with zero mutations; a snapshot key
    /// with no matching live element is skipped silently. When
    /// `delay_ms > 0` the engine suspends between keys (not before the
    /// first) to pace rapid edits for pages with debounced handlers. Keys
    /// are processed strictly in the mapping's iteration order; once
    /// started, a restore runs to completion.
    pub async fn restore(
        &self,
        document: &mut FormDocument,
        identity: &str,
        snapshot: &Snapshot,
        delay_ms: u64,
    ) -> crate::Result<RestoreReport> {
        let form = match locate_form(document, identity) {
            Ok(form) => form,
            Err(FormVaultError::RecordNotFound(_)) => {
                warn!(identity, "no live form to restore into");
                return Ok(RestoreReport {
                    found: false,
                    updated: 0,
                    name: snapshot.name.clone(),
                });
            }
            Err(err) => return Err(err),
        };

        let mut updated = 0;
        for (index, (key, stored)) in snapshot.data.iter().enumerate() {
            if index > 0 && delay_ms > 0 {
                sleep(Duration::from_millis(delay_ms)).await;
            }
            let value = stored.normalize().value;
            let mut touched = 0;
            for field in form
                .fields
                .iter_mut()
                .filter(|f| {
                    f.name.as_deref() == Some(key.as_str())
                        || f.id.as_deref() == Some(key.as_str())
                })
            {
                field.apply(&value);
                self.notifier.notify(key, ChangeKind::Input);
                self.notifier.notify(key, ChangeKind::Change);
                touched += 1;
            }
            if touched == 0 {
                debug!(key, "snapshot key has no live element, skipped");
            }
            updated += touched;
        }

        info!(identity, name = %snapshot.name, updated, "restore complete");
        Ok(RestoreReport {
            found: true,
            updated,
            name: snapshot.name.clone(),
        })
    }
}

/// Resolve the live form for an identity: id equal to the identity's local
/// part, else a class token equal to it, else the document's first form.
fn locate_form<'d>(
    document: &'d mut FormDocument,
    identity: &str,
) -> crate::Result<&'d mut LiveForm> {
    let local = identity.split('/').nth(1).unwrap_or_default();
    let index = document
        .forms
        .iter()
        .position(|f| f.id.as_deref() == Some(local))
        .or_else(|| document.forms.iter().position(|f| f.has_class(local)))
        .or(if document.forms.is_empty() {
            None
        } else {
            Some(0)
        });
    match index {
        Some(index) => Ok(&mut document.forms[index]),
        None => Err(FormVaultError::RecordNotFound(identity.to_string())),
    }
}
