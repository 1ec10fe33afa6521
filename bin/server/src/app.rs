//! Main Leptos application component and routing.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};
use study_sync_core::DeliveredIdentity;

use crate::pages::{FeedPage, LoginFailedPage, LoginPage, ProfilePage};

/// Who the client believes is signed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Reconciliation has not finished yet.
    Pending,
    LoggedOut,
    SignedIn(DeliveredIdentity),
}

impl SessionState {
    #[must_use]
    pub fn identity(&self) -> Option<&DeliveredIdentity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Pending | Self::LoggedOut => None,
        }
    }
}

/// The session signal shared by every page.
#[must_use]
pub fn use_session() -> RwSignal<SessionState> {
    expect_context::<RwSignal<SessionState>>()
}

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let session = RwSignal::new(SessionState::Pending);
    provide_context(session);

    // Effects only run in the browser, where the identity lives.
    Effect::new(move |_| {
        #[cfg(feature = "hydrate")]
        crate::browser::reconcile_into(session);
    });

    view! {
        <Title text="study-sync"/>
        <Router>
            <Header/>
            <main class="container">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=HomePage/>
                    <Route path=path!("/dashboard") view=FeedPage/>
                    <Route path=path!("/profile") view=ProfilePage/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/login-failed") view=LoginFailedPage/>
                </Routes>
            </main>
        </Router>
    }
}

/// Header with the signed-in user and a logout link.
#[component]
fn Header() -> impl IntoView {
    let session = use_session();

    let forget = move |_| {
        #[cfg(feature = "hydrate")]
        crate::browser::forget_identity();
        session.set(SessionState::LoggedOut);
    };

    view! {
        <header class="header">
            <a href="/" class="logo">"study-sync"</a>
            {move || match session.get() {
                SessionState::SignedIn(identity) => view! {
                    <div class="user-menu">
                        <a href="/profile" class="user-name">{identity.display_name}</a>
                        " "
                        <a href="/auth/logout" rel="external" on:click=forget>"Log out"</a>
                    </div>
                }.into_any(),
                SessionState::LoggedOut => view! {
                    <a href="/auth/provider" rel="external" class="login-button">"Log in"</a>
                }.into_any(),
                SessionState::Pending => view! { <span></span> }.into_any(),
            }}
        </header>
    }
}

/// Landing page: the feed when signed in, the login entry point otherwise.
#[component]
fn HomePage() -> impl IntoView {
    let session = use_session();

    move || match session.get() {
        SessionState::SignedIn(_) => view! { <FeedPage/> }.into_any(),
        SessionState::LoggedOut => view! { <LoginPage/> }.into_any(),
        SessionState::Pending => view! { <p>"Loading..."</p> }.into_any(),
    }
}
