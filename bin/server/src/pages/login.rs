//! Login entry point and the failed-login page.

use leptos::prelude::*;

/// Login page - starts the provider flow.
#[component]
pub fn LoginPage() -> impl IntoView {
    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Log in to study-sync"</h1>
                <p>"Share posts and study resources with your classmates."</p>
                <a href="/auth/provider" rel="external" class="login-button">"Log in with Google"</a>
            </div>
        </div>
    }
}

/// Where the server sends the browser when the provider flow fails.
#[component]
pub fn LoginFailedPage() -> impl IntoView {
    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Login failed"</h1>
                <p class="error">"We could not sign you in. Please try again."</p>
                <a href="/auth/provider" rel="external" class="login-button">"Try again"</a>
            </div>
        </div>
    }
}
