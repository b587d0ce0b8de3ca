use anyhow::{anyhow, Context, Result};
use ballot_client::error::ClientError;
use ballot_client::models::auth::{LoginOutcome, RegistrationForm};
use ballot_client::models::candidate::{ApplicationForm, ProfilePicture, DEFAULT_PARTY};
use ballot_client::models::config::AppConfig;
use ballot_client::models::{CandidateId, Route};
use ballot_client::services::api::SharedApi;
use ballot_client::services::auth::AuthService;
use ballot_client::services::ballot::BallotView;
use ballot_client::services::home::load_home;
use ballot_client::services::navigation::Navigator;
use ballot_client::services::reconciler::{CandidateReconciler, ProfileSnapshot};
use ballot_client::services::results::load_results;
use ballot_client::services::session::SessionStore;
use ballot_client::services::validation::password_strength;
use ballot_client::services::wakeup::{WakeUpMonitor, WakeUpStatus};
use ballot_client::utils::images::resolve_image_url;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

/// Shared state for every command.
pub struct AppContext {
    pub api: SharedApi,
    pub session: SessionStore,
    pub navigator: Navigator,
    pub config: AppConfig,
}

impl AppContext {
    fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.session.clone(), self.navigator.clone())
    }

    fn reconciler(&self) -> CandidateReconciler {
        CandidateReconciler::new(
            self.api.clone(),
            self.session.clone(),
            self.navigator.clone(),
            self.config.polling.vote_refresh_period(),
        )
    }

    fn image_url(&self, path: Option<&str>) -> Option<String> {
        resolve_image_url(&self.config.api.base_url, path, &self.config.images.legacy_hosts)
    }
}

fn shown(err: ClientError) -> anyhow::Error {
    anyhow!(err.user_message())
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    match ctx.auth().login(email, password).await.map_err(shown)? {
        LoginOutcome::LoggedIn => println!("Logged in."),
        LoginOutcome::RegistrationHint => {
            println!("No account found with this email. Register with `ballot register`.")
        }
    }
    Ok(())
}

pub async fn register(ctx: &AppContext, name: String, email: String, password: String, confirm: String) -> Result<()> {
    let strength = password_strength(&password);
    if !strength.label.is_empty() {
        println!("Password strength: {} ({}%)", strength.label, strength.score);
    }

    let form = RegistrationForm {
        name,
        email,
        password,
        confirm_password: confirm,
    };
    ctx.auth().register(&form).await.map_err(shown)?;
    println!("Account created. You are now logged in.");
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.auth().logout();
    println!("Logged out.");
    Ok(())
}

pub async fn home(ctx: &AppContext) -> Result<()> {
    let summary = load_home(&ctx.api, &ctx.session, &ctx.navigator)
        .await
        .map_err(shown)?;

    println!("{}", summary.greeting());
    println!("  Voters:     {}", summary.stats.total_voters);
    println!("  Candidates: {}", summary.stats.total_candidates);
    println!("  Votes cast: {}", summary.stats.total_votes);
    Ok(())
}

fn print_profile(ctx: &AppContext, snapshot: &ProfileSnapshot) {
    if let Some(user) = &snapshot.user {
        println!("{} <{}> ({})", user.name, user.email, user.role);
        if let Some(url) = ctx.image_url(user.profile_picture_url.as_deref()) {
            println!("  Picture: {}", url);
        }
    }

    match snapshot.status.candidate.as_ref() {
        Some(candidate) if candidate.is_active => {
            println!("Active candidate for {}", candidate.party.as_deref().unwrap_or(DEFAULT_PARTY));
            println!("  Votes today: {}", snapshot.vote_count);
        }
        Some(_) => println!("Candidacy withdrawn. `ballot apply` re-activates it with your previous details."),
        None => println!("Not a candidate."),
    }
}

pub async fn profile(ctx: &AppContext) -> Result<()> {
    let mut reconciler = ctx.reconciler();
    reconciler.mount().await.map_err(shown)?;
    print_profile(ctx, &reconciler.snapshot());
    Ok(())
}

/// Fields given on the command line; anything absent keeps the pre-filled value.
#[derive(Debug, Default)]
pub struct FormEdits {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub party: Option<String>,
    pub description: Option<String>,
}

impl FormEdits {
    fn apply_to(self, form: &mut ApplicationForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.dob, &mut form.dob),
            (self.gender, &mut form.gender),
            (self.party, &mut form.party),
            (self.description, &mut form.description),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

async fn read_picture(path: PathBuf) -> Result<ProfilePicture> {
    let bytes = fs::read(&path)
        .await
        .with_context(|| format!("Failed to read picture {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile.jpg".to_string());
    Ok(ProfilePicture { file_name, bytes })
}

pub async fn apply(ctx: &AppContext, edits: FormEdits, picture: Option<PathBuf>) -> Result<()> {
    let picture = match picture {
        Some(path) => Some(read_picture(path).await?),
        None => None,
    };

    let mut reconciler = ctx.reconciler();
    reconciler.mount().await.map_err(shown)?;

    reconciler.update_form(|form| edits.apply_to(form));
    let outcome = reconciler
        .apply(reconciler.form(), picture)
        .await
        .map_err(shown)?;

    println!("{}", outcome.message());
    print_profile(ctx, &reconciler.snapshot());
    Ok(())
}

pub async fn upload_picture(ctx: &AppContext, path: PathBuf) -> Result<()> {
    let picture = read_picture(path).await?;

    let mut reconciler = ctx.reconciler();
    reconciler.mount().await.map_err(shown)?;
    let url = reconciler.upload_picture(picture).await.map_err(shown)?;
    reconciler.unmount();

    match ctx.image_url(Some(&url)) {
        Some(resolved) => println!("Profile picture updated: {}", resolved),
        None => println!("Profile picture updated."),
    }
    Ok(())
}

pub async fn revoke(ctx: &AppContext) -> Result<()> {
    let mut reconciler = ctx.reconciler();
    reconciler.mount().await.map_err(shown)?;
    reconciler.revoke().await.map_err(shown)?;
    println!("Your candidacy has been revoked.");
    Ok(())
}

pub async fn watch(ctx: &AppContext) -> Result<()> {
    let mut reconciler = ctx.reconciler();
    reconciler.mount().await.map_err(shown)?;
    if !reconciler.is_candidate() {
        println!("Not a candidate; nothing to watch.");
        return Ok(());
    }

    let mut last = reconciler.vote_count();
    println!("Votes: {}", last);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let count = reconciler.vote_count();
                if count != last {
                    println!("Votes: {}", count);
                    last = count;
                }
                if !ctx.session.is_logged_in() {
                    warn!("Session ended while watching");
                    break;
                }
            }
        }
    }

    reconciler.unmount();
    info!("Stopped watching vote count");
    Ok(())
}

pub async fn candidates(ctx: &AppContext) -> Result<()> {
    let view = BallotView::load(
        ctx.api.clone(),
        ctx.session.clone(),
        ctx.navigator.clone(),
        ctx.config.polling.results_redirect_delay(),
    )
    .await
    .map_err(shown)?;

    if let Some(window) = &view.window {
        let state = if window.is_open { "open" } else { "closed" };
        println!("Voting is {} ({}). Server time: {}", state, window.hours_description, window.server_time);
        if !window.message.is_empty() {
            println!("{}", window.message);
        }
    }
    println!("{}", view.headline());

    let today = chrono::Local::now().date_naive();
    for candidate in &view.candidates {
        let age = candidate
            .age_on(today)
            .map(|a| format!(", {} yrs", a))
            .unwrap_or_default();
        println!("  [{}] {} ({}{})", candidate.id, candidate.name, candidate.party_label(), age);
        if let Some(description) = candidate.description.as_deref().filter(|d| !d.is_empty()) {
            println!("      {}", description);
        }
    }
    Ok(())
}

pub async fn vote(ctx: &AppContext, candidate_id: CandidateId) -> Result<()> {
    let view = BallotView::load(
        ctx.api.clone(),
        ctx.session.clone(),
        ctx.navigator.clone(),
        ctx.config.polling.results_redirect_delay(),
    )
    .await
    .map_err(shown)?;

    let Some(candidate) = view.candidate(candidate_id) else {
        return Err(anyhow!("No candidate with id {}", candidate_id));
    };
    let name = candidate.name.clone();

    view.guard.select(candidate_id);
    let receipt = view.guard.submit().await?;
    println!(
        "{}",
        receipt
            .message
            .unwrap_or_else(|| format!("Vote cast for {}", name))
    );

    let mut routes = ctx.navigator.subscribe();
    if routes.wait_for(|route| *route == Some(Route::Results)).await.is_ok() {
        results(ctx).await?;
    }
    Ok(())
}

pub async fn results(ctx: &AppContext) -> Result<()> {
    let view = load_results(&ctx.api, &ctx.session, &ctx.navigator)
        .await
        .map_err(shown)?;

    if !view.voting_status().is_empty() {
        println!("{}", view.voting_status());
    }
    if let Some(notice) = view.revoked_notice() {
        println!("{}", notice);
    }
    if let Some(winner) = view.take_celebration() {
        println!("Winner: {} ({} votes)", winner.name, winner.vote_count);
        if let Some(tie) = view.tie_info() {
            println!("{}", tie);
        }
    }

    println!("{} votes across {} candidates", view.total_votes(), view.total_candidates());
    for (place, row) in view.rows().iter().enumerate() {
        let marker = if row.is_winner { " *" } else { "" };
        println!(
            "  {}. {} ({}) {} votes, {:.1}%{}",
            place + 1,
            row.candidate.name,
            row.candidate.party_label(),
            row.candidate.vote_count,
            row.percentage,
            marker
        );
    }
    Ok(())
}

pub async fn wait_ready(ctx: &AppContext) -> Result<()> {
    let monitor = WakeUpMonitor::new(ctx.api.clone(), &ctx.config.wakeup);
    let mut status = monitor.subscribe();

    let printer = async {
        while status.changed().await.is_ok() {
            match *status.borrow() {
                WakeUpStatus::Counting { remaining_secs } => {
                    info!("Server waking up, {}s left ({}%)", remaining_secs, monitor.progress())
                }
                WakeUpStatus::Probing { attempt } => info!("Checking server, attempt {}", attempt),
                WakeUpStatus::Ready => break,
            }
        }
    };

    let (attempts, _) = tokio::join!(monitor.run(), printer);
    println!("Server is ready ({} checks).", attempts);
    Ok(())
}

pub fn show_config(ctx: &AppContext) -> Result<()> {
    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
