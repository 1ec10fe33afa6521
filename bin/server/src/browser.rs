//! Browser glue: local storage, startup reconciliation and API access.

use leptos::prelude::{RwSignal, Set};
use leptos::task::spawn_local;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use study_sync_client::{
    ApiClient, ClientError, ClientIdentityStore, HttpSessionProbe, IDENTITY_KEY, Reconciler,
    storage_write_succeeded,
};
use tracing::warn;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::app::SessionState;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// [`ClientIdentityStore`] over `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl ClientIdentityStore for LocalStorageStore {
    fn get(&self) -> Option<String> {
        local_storage()?.get_item(IDENTITY_KEY).ok().flatten()
    }

    fn set(&self, raw: &str) {
        let stored = local_storage().map(|s| s.set_item(IDENTITY_KEY, raw));
        storage_write_succeeded("persist identity", stored);
    }

    fn clear(&self) {
        let removed = local_storage().map(|s| s.remove_item(IDENTITY_KEY));
        storage_write_succeeded("clear identity", removed);
    }
}

thread_local! {
    static RECONCILER: RefCell<Option<Rc<Reconciler<HttpSessionProbe>>>> =
        const { RefCell::new(None) };
}

fn origin() -> Result<String, ClientError> {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .ok_or_else(|| ClientError::Transport {
            details: "no window location".to_string(),
        })
}

/// A client for the API on this page's origin.
pub fn api_client() -> Result<ApiClient, ClientError> {
    ApiClient::new(&origin()?, Arc::new(LocalStorageStore))
}

fn reconciler() -> Result<Rc<Reconciler<HttpSessionProbe>>, ClientError> {
    if let Some(existing) = RECONCILER.with(|r| r.borrow().clone()) {
        return Ok(existing);
    }
    let probe = api_client()?.session_probe();
    let created = Rc::new(Reconciler::new(Arc::new(LocalStorageStore), probe));
    RECONCILER.with(|r| *r.borrow_mut() = Some(created.clone()));
    Ok(created)
}

/// Runs startup reconciliation and publishes the outcome to `session`.
pub fn reconcile_into(session: RwSignal<SessionState>) {
    spawn_local(async move {
        let reconciler = match reconciler() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "cannot reconcile identity");
                session.set(SessionState::LoggedOut);
                return;
            }
        };

        let Some(window) = web_sys::window() else {
            return;
        };
        let href = window.location().href().unwrap_or_default();
        let outcome = reconciler.run(&href).await;

        if let Some(cleaned) = outcome.cleaned_url
            && let Ok(history) = window.history()
            && let Err(e) = history.replace_state_with_url(&JsValue::NULL, "", Some(&cleaned))
        {
            warn!(error = ?e, "could not clean the address bar");
        }

        session.set(match outcome.identity {
            Some(identity) => SessionState::SignedIn(identity),
            None => SessionState::LoggedOut,
        });
    });
}

/// Drops the persisted identity, ahead of a server logout.
pub fn forget_identity() {
    LocalStorageStore.clear();
}

/// Reads the first file picked in `input`. `None` when nothing is picked.
pub async fn read_picked_file(
    input: &web_sys::HtmlInputElement,
) -> Result<Option<(String, Vec<u8>)>, String> {
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        return Ok(None);
    };
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("could not read {}: {e:?}", file.name()))?;
    Ok(Some((file.name(), js_sys::Uint8Array::new(&buffer).to_vec())))
}

/// Runs one API call, signing the page out when the call finds the
/// identity gone.
pub async fn call<T, F, Fut>(session: RwSignal<SessionState>, f: F) -> Result<T, String>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let api = api_client().map_err(|e| e.to_string())?;
    match f(api).await {
        Ok(value) => Ok(value),
        Err(ClientError::NotAuthenticated) => {
            session.set(SessionState::LoggedOut);
            Err("Please log in again.".to_string())
        }
        Err(e) => Err(e.to_string()),
    }
}
