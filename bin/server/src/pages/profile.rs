//! The signed-in user's own posts and resources, and the form for sharing a
//! new resource.

use leptos::html::Input;
use leptos::prelude::*;
use leptos::task::spawn_local;
use study_sync_content::{PostView, ResourceView};

use crate::app::{SessionState, use_session};
use crate::pages::LoginPage;

/// What the share form collected, minus the file.
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub title: String,
    pub description: String,
}

#[cfg(feature = "hydrate")]
mod remote {
    use leptos::html::Input;
    use leptos::prelude::{GetUntracked, NodeRef, RwSignal};
    use study_sync_content::{NewResource, PostView, ResourceView};
    use study_sync_core::{PostId, ResourceId};

    use super::ResourceDraft;
    use crate::app::SessionState;
    use crate::browser::{call, read_picked_file};

    pub async fn my_posts(session: RwSignal<SessionState>) -> Result<Vec<PostView>, String> {
        call(session, |api| async move { api.my_posts().await }).await
    }

    pub async fn my_resources(session: RwSignal<SessionState>) -> Result<Vec<ResourceView>, String> {
        call(session, |api| async move { api.my_resources().await }).await
    }

    pub async fn delete_post(session: RwSignal<SessionState>, id: PostId) -> Result<(), String> {
        call(session, |api| async move { api.delete_post(id).await }).await
    }

    pub async fn delete_resource(
        session: RwSignal<SessionState>,
        id: ResourceId,
    ) -> Result<(), String> {
        call(session, |api| async move { api.delete_resource(id).await }).await
    }

    /// Uploads the picked file, then records it as a resource.
    pub async fn share_resource(
        session: RwSignal<SessionState>,
        draft: ResourceDraft,
        file_input: NodeRef<Input>,
    ) -> Result<ResourceView, String> {
        let input = file_input
            .get_untracked()
            .ok_or_else(|| "the file picker is gone".to_string())?;
        let (name, bytes) = read_picked_file(&input)
            .await?
            .ok_or_else(|| "Please choose a file to share.".to_string())?;

        let resource = call(session, |api| async move {
            let stored = api.upload_file(&name, bytes).await?;
            api.create_resource(&NewResource {
                title: draft.title,
                description: draft.description,
                url: stored.url,
                storage_id: stored.storage_id,
            })
            .await
        })
        .await?;
        input.set_value("");
        Ok(resource)
    }
}

#[cfg(not(feature = "hydrate"))]
mod remote {
    use leptos::html::Input;
    use leptos::prelude::{NodeRef, RwSignal};
    use study_sync_content::{PostView, ResourceView};
    use study_sync_core::{PostId, ResourceId};

    use super::ResourceDraft;
    use crate::app::SessionState;

    const UNAVAILABLE: &str = "not available during server rendering";

    pub async fn my_posts(_: RwSignal<SessionState>) -> Result<Vec<PostView>, String> {
        Ok(Vec::new())
    }

    pub async fn my_resources(_: RwSignal<SessionState>) -> Result<Vec<ResourceView>, String> {
        Ok(Vec::new())
    }

    pub async fn delete_post(_: RwSignal<SessionState>, _: PostId) -> Result<(), String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn delete_resource(_: RwSignal<SessionState>, _: ResourceId) -> Result<(), String> {
        Err(UNAVAILABLE.to_string())
    }

    pub async fn share_resource(
        _: RwSignal<SessionState>,
        _: ResourceDraft,
        _: NodeRef<Input>,
    ) -> Result<ResourceView, String> {
        Err(UNAVAILABLE.to_string())
    }
}

/// `/profile`: what the signed-in user has shared.
#[component]
pub fn ProfilePage() -> impl IntoView {
    let session = use_session();

    move || match session.get() {
        SessionState::SignedIn(identity) => view! {
            <h1>{identity.display_name}</h1>
            <MyResources/>
            <MyPosts/>
        }
        .into_any(),
        SessionState::LoggedOut => view! { <LoginPage/> }.into_any(),
        SessionState::Pending => view! { <p>"Loading..."</p> }.into_any(),
    }
}

#[component]
fn MyResources() -> impl IntoView {
    let session = use_session();
    let resources = RwSignal::new(Vec::<ResourceView>::new());
    let error = RwSignal::new(None::<String>);
    let title = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());
    let sharing = RwSignal::new(false);
    let file_input = NodeRef::<Input>::new();

    Effect::new(move |_| {
        spawn_local(async move {
            match remote::my_resources(session).await {
                Ok(list) => resources.set(list),
                Err(e) => error.set(Some(e)),
            }
        });
    });

    let share = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = ResourceDraft {
            title: title.get_untracked(),
            description: description.get_untracked(),
        };
        sharing.set(true);
        spawn_local(async move {
            match remote::share_resource(session, draft, file_input).await {
                Ok(resource) => {
                    resources.update(|list| list.insert(0, resource));
                    title.set(String::new());
                    description.set(String::new());
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
            sharing.set(false);
        });
    };

    view! {
        <section class="resources">
            <h2>"My resources"</h2>
            <form class="share-form" on:submit=share>
                <input
                    type="text"
                    placeholder="Title"
                    prop:value=move || title.get()
                    on:input=move |ev| title.set(event_target_value(&ev))
                />
                <textarea
                    placeholder="What is it about?"
                    prop:value=move || description.get()
                    on:input=move |ev| description.set(event_target_value(&ev))
                ></textarea>
                <input type="file" name="file" node_ref=file_input/>
                <button type="submit" disabled=move || sharing.get()>
                    {move || if sharing.get() { "Sharing..." } else { "Share" }}
                </button>
            </form>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
            <For
                each=move || resources.get()
                key=|r: &ResourceView| r.id
                children=move |r: ResourceView| {
                    let id = r.id;
                    let remove = move |_| {
                        spawn_local(async move {
                            match remote::delete_resource(session, id).await {
                                Ok(()) => resources.update(|list| list.retain(|r| r.id != id)),
                                Err(e) => error.set(Some(e)),
                            }
                        });
                    };
                    view! {
                        <div class="post">
                            <a href=r.url rel="external" target="_blank">{r.title}</a>
                            <p>{r.description}</p>
                            <div class="post-actions">
                                <button on:click=remove>"Delete"</button>
                            </div>
                        </div>
                    }
                }
            />
        </section>
    }
}

#[component]
fn MyPosts() -> impl IntoView {
    let session = use_session();
    let posts = RwSignal::new(Vec::<PostView>::new());
    let error = RwSignal::new(None::<String>);

    Effect::new(move |_| {
        spawn_local(async move {
            match remote::my_posts(session).await {
                Ok(list) => posts.set(list),
                Err(e) => error.set(Some(e)),
            }
        });
    });

    view! {
        <section class="feed">
            <h2>"My posts"</h2>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
            <For
                each=move || posts.get()
                key=|p: &PostView| p.id
                children=move |post: PostView| {
                    let id = post.id;
                    let remove = move |_| {
                        spawn_local(async move {
                            match remote::delete_post(session, id).await {
                                Ok(()) => posts.update(|list| list.retain(|p| p.id != id)),
                                Err(e) => error.set(Some(e)),
                            }
                        });
                    };
                    view! {
                        <article class="post">
                            <time>{post.timestamp.format("%Y-%m-%d %H:%M").to_string()}</time>
                            <p>{post.content}</p>
                            <div class="post-actions">
                                <span>{post.likes.len()} " likes, " {post.comments.len()} " comments"</span>
                                <button on:click=remove>"Delete"</button>
                            </div>
                        </article>
                    }
                }
            />
        </section>
    }
}
