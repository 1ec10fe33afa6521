//! The feed: posts with likes and comments, and shared resources.

use leptos::prelude::*;
use leptos::task::spawn_local;
use study_sync_content::{PostView, ResourceView};
use study_sync_core::UserId;

use crate::app::{SessionState, use_session};
use crate::pages::LoginPage;

#[cfg(feature = "hydrate")]
mod remote {
    use leptos::prelude::RwSignal;
    use study_sync_content::{PostView, ResourceView};
    use study_sync_core::PostId;

    use crate::app::SessionState;
    use crate::browser::call;

    pub async fn list_posts(session: RwSignal<SessionState>) -> Result<Vec<PostView>, String> {
        call(session, |api| async move { api.list_posts().await }).await
    }

    pub async fn create_post(
        session: RwSignal<SessionState>,
        content: String,
    ) -> Result<PostView, String> {
        call(session, |api| async move { api.create_post(&content).await }).await
    }

    pub async fn toggle_like(session: RwSignal<SessionState>, id: PostId) -> Result<PostView, String> {
        call(session, |api| async move { api.toggle_like(id).await }).await
    }

    pub async fn add_comment(
        session: RwSignal<SessionState>,
        id: PostId,
        text: String,
    ) -> Result<PostView, String> {
        call(session, |api| async move { api.add_comment(id, &text).await }).await
    }

    pub async fn delete_post(session: RwSignal<SessionState>, id: PostId) -> Result<(), String> {
        call(session, |api| async move { api.delete_post(id).await }).await
    }

    pub async fn list_resources(
        session: RwSignal<SessionState>,
    ) -> Result<Vec<ResourceView>, String> {
        call(session, |api| async move { api.list_resources().await }).await
    }
}

// Server rendering never shows a signed-in feed; these exist so the page
// compiles without the browser client.
#[cfg(not(feature = "hydrate"))]
mod remote {
    use leptos::prelude::RwSignal;
    use study_sync_content::{PostView, ResourceView};
    use study_sync_core::PostId;

    use crate::app::SessionState;

    const UNAVAILABLE: &str = "not available during server rendering";

    pub async fn list_posts(_: RwSignal<SessionState>) -> Result<Vec<PostView>, String> {
        Ok(Vec::new())
    }

    pub async fn create_post(_: RwSignal<SessionState>, _: String) -> Result<PostView, String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn toggle_like(_: RwSignal<SessionState>, _: PostId) -> Result<PostView, String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn add_comment(
        _: RwSignal<SessionState>,
        _: PostId,
        _: String,
    ) -> Result<PostView, String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn delete_post(_: RwSignal<SessionState>, _: PostId) -> Result<(), String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn list_resources(_: RwSignal<SessionState>) -> Result<Vec<ResourceView>, String> {
        Ok(Vec::new())
    }
}

/// The signed-in landing page.
#[component]
pub fn FeedPage() -> impl IntoView {
    let session = use_session();

    move || match session.get() {
        SessionState::SignedIn(identity) => view! {
            <Feed me=identity.user_id()/>
            <Resources/>
        }
        .into_any(),
        SessionState::LoggedOut => view! { <LoginPage/> }.into_any(),
        SessionState::Pending => view! { <p>"Loading..."</p> }.into_any(),
    }
}

#[component]
fn Feed(me: Option<UserId>) -> impl IntoView {
    let session = use_session();
    let posts = RwSignal::new(Vec::<PostView>::new());
    let error = RwSignal::new(None::<String>);
    let draft = RwSignal::new(String::new());

    Effect::new(move |_| {
        spawn_local(async move {
            match remote::list_posts(session).await {
                Ok(list) => posts.set(list),
                Err(e) => error.set(Some(e)),
            }
        });
    });

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let content = draft.get_untracked();
        spawn_local(async move {
            match remote::create_post(session, content).await {
                Ok(post) => {
                    posts.update(|list| list.insert(0, post));
                    draft.set(String::new());
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
        <section class="feed">
            <form class="composer" on:submit=submit>
                <textarea
                    placeholder="Share something with your classmates..."
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                ></textarea>
                <button type="submit">"Post"</button>
            </form>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
            <For
                each=move || posts.get()
                key=|p: &PostView| (p.id, p.likes.len(), p.comments.len())
                children=move |post: PostView| view! {
                    <PostCard post=post me=me posts=posts error=error/>
                }
            />
        </section>
    }
}

#[component]
fn PostCard(
    post: PostView,
    me: Option<UserId>,
    posts: RwSignal<Vec<PostView>>,
    error: RwSignal<Option<String>>,
) -> impl IntoView {
    let session = use_session();
    let id = post.id;
    let mine = me == Some(post.author.id);
    let like_label = if me.is_some_and(|m| post.is_liked_by(m)) {
        "Unlike"
    } else {
        "Like"
    };
    let comment_draft = RwSignal::new(String::new());

    let replace = move |updated: PostView| {
        posts.update(|list| {
            if let Some(slot) = list.iter_mut().find(|p| p.id == updated.id) {
                *slot = updated;
            }
        });
    };

    let like = move |_| {
        spawn_local(async move {
            match remote::toggle_like(session, id).await {
                Ok(updated) => replace(updated),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let remove = move |_| {
        spawn_local(async move {
            match remote::delete_post(session, id).await {
                Ok(()) => posts.update(|list| list.retain(|p| p.id != id)),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let comment = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = comment_draft.get_untracked();
        spawn_local(async move {
            match remote::add_comment(session, id, text).await {
                Ok(updated) => replace(updated),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let comments = post
        .comments
        .into_iter()
        .map(|c| {
            view! {
                <div class="comment">
                    <span class="comment-author">{c.author.display_name}</span>
                    ": "
                    {c.text}
                </div>
            }
        })
        .collect_view();

    view! {
        <article class="post">
            <div class="post-author">{post.author.display_name}</div>
            <time>{post.timestamp.format("%Y-%m-%d %H:%M").to_string()}</time>
            <p>{post.content}</p>
            <div class="post-actions">
                <button on:click=like>{like_label} " (" {post.likes.len()} ")"</button>
                {mine.then(|| view! { <button on:click=remove>"Delete"</button> })}
            </div>
            {comments}
            <form class="comment-form" on:submit=comment>
                <input
                    type="text"
                    placeholder="Write a comment"
                    prop:value=move || comment_draft.get()
                    on:input=move |ev| comment_draft.set(event_target_value(&ev))
                />
            </form>
        </article>
    }
}

#[component]
fn Resources() -> impl IntoView {
    let session = use_session();
    let resources = RwSignal::new(Vec::<ResourceView>::new());

    Effect::new(move |_| {
        spawn_local(async move {
            if let Ok(list) = remote::list_resources(session).await {
                resources.set(list);
            }
        });
    });

    view! {
        <section class="resources">
            <h2>"Shared resources"</h2>
            <For
                each=move || resources.get()
                key=|r: &ResourceView| r.id
                children=move |r: ResourceView| view! {
                    <div class="post">
                        <a href=r.url rel="external" target="_blank">{r.title}</a>
                        <p>{r.description}</p>
                        <span class="post-author">{r.author.display_name}</span>
                    </div>
                }
            />
        </section>
    }
}
