use std::path::{Path, PathBuf};

use api_types::budget::{BudgetForm, BudgetPatch};
use chrono::{NaiveDateTime, Utc};
use engine::{Budget, BudgetDashboard};
use report::{ChartRenderer, PlottersRasterizer, Rasterizer};

use crate::{
    client::Client,
    config::{AppConfig, Command},
    error::{AppError, Result},
    view,
};

#[derive(Debug, Default)]
pub struct AppState {
    pub budget: Option<Budget>,
    pub dashboard: Option<BudgetDashboard>,
    /// Set while an export runs; a second export is refused.
    pub exporting: bool,
    pub last_export: Option<PathBuf>,
    pub error: Option<String>,
}

pub struct App<R = PlottersRasterizer> {
    config: AppConfig,
    client: Client,
    renderer: ChartRenderer<R>,
    pub state: AppState,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_rasterizer(config, PlottersRasterizer)
    }
}

impl<R: Rasterizer> App<R> {
    pub fn with_rasterizer(config: AppConfig, rasterizer: R) -> Result<Self> {
        let client = Client::new(&config.base_url, config.token.clone())?;
        let renderer = ChartRenderer::new(rasterizer).with_settle(config.settle());
        Ok(Self {
            config,
            client,
            renderer,
            state: AppState::default(),
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Show => {
                self.load().await?;
                if let Some(dashboard) = &self.state.dashboard {
                    println!("{}", view::render(dashboard));
                }
            }
            Command::Export => {
                self.load().await?;
                let path = self.export().await?;
                println!("{}", path.display());
            }
            Command::Push { id } => {
                let budget = self.push(id).await?;
                match budget.id() {
                    Some(id) => println!("budget {id} enregistré"),
                    None => println!("budget enregistré"),
                }
            }
            Command::Delete { id } => {
                self.delete(id).await?;
                println!("budget {id} supprimé");
            }
        }
        Ok(())
    }

    /// Loads the budget and derives (or fetches) its dashboard.
    ///
    /// A failure is kept in `state.error` and returned.
    pub async fn load(&mut self) -> Result<()> {
        let (budget, dashboard) = match self.load_dashboard().await {
            Ok(loaded) => loaded,
            Err(err) => {
                self.state.error = Some(err.to_string());
                return Err(err);
            }
        };
        tracing::debug!(
            level = dashboard.recommandation.level.as_str(),
            by_entry = dashboard.revenue_by_entry(),
            "dashboard ready"
        );

        self.state.budget = Some(budget);
        self.state.dashboard = Some(dashboard);
        self.state.error = None;
        Ok(())
    }

    async fn load_dashboard(&self) -> Result<(Budget, BudgetDashboard)> {
        let budget = self.load_budget().await?;
        let dashboard = if self.config.use_server_dashboard && self.config.budget_file.is_none() {
            BudgetDashboard::try_from(self.client.get_dashboard().await?)?
        } else {
            engine::compute(&budget)?
        };
        Ok((budget, dashboard))
    }

    async fn load_budget(&self) -> Result<Budget> {
        match &self.config.budget_file {
            Some(path) => read_budget_file(path).await,
            None => Ok(Budget::try_from(self.client.get_budget().await?)?),
        }
    }

    /// Exports the loaded dashboard to the configured output directory.
    pub async fn export(&mut self) -> Result<PathBuf> {
        if self.state.exporting {
            return Err(AppError::ExportInProgress);
        }
        let Some(dashboard) = self.state.dashboard.as_ref() else {
            return Err(AppError::InvalidInput("no dashboard loaded".to_string()));
        };
        let generated_at = Utc::now()
            .with_timezone(&self.config.timezone()?)
            .naive_local();

        self.state.exporting = true;
        let result = render_and_save(
            dashboard,
            &self.renderer,
            generated_at,
            &self.config.output_dir,
        )
        .await;
        self.state.exporting = false;

        match result {
            Ok(path) => {
                self.state.last_export = Some(path.clone());
                Ok(path)
            }
            Err(err) => {
                tracing::warn!("export failed: {err}");
                self.state.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Sends the local budget file to the API.
    pub async fn push(&mut self, id: Option<i64>) -> Result<Budget> {
        let Some(path) = &self.config.budget_file else {
            return Err(AppError::InvalidInput(
                "push needs --budget-file".to_string(),
            ));
        };
        let form = read_budget_file(path).await?.to_form();
        let saved = match id {
            Some(id) => self.client.update_budget(id, &patch_from(form)).await?,
            None => self.client.create_budget(&form).await?,
        };
        let budget = Budget::try_from(saved)?;
        tracing::info!(id = budget.id(), "budget saved");
        self.state.budget = Some(budget.clone());
        self.state.dashboard = None;
        Ok(budget)
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client.delete_budget(id).await?;
        tracing::info!(id, "budget deleted");
        self.state.budget = None;
        self.state.dashboard = None;
        Ok(())
    }
}

async fn render_and_save<R: Rasterizer>(
    dashboard: &BudgetDashboard,
    renderer: &ChartRenderer<R>,
    generated_at: NaiveDateTime,
    output_dir: &Path,
) -> report::Result<PathBuf> {
    let report = report::build_report(dashboard, renderer, generated_at).await?;
    tracing::info!(
        pages = report.page_count,
        charts = report.charts.len(),
        "report built"
    );
    report.save(output_dir).await
}

async fn read_budget_file(path: &Path) -> Result<Budget> {
    let raw = tokio::fs::read_to_string(path).await?;
    let form: BudgetForm = serde_json::from_str(&raw)?;
    Ok(Budget::try_from(form)?)
}

fn patch_from(form: BudgetForm) -> BudgetPatch {
    BudgetPatch {
        nombre_personnes: Some(form.nombre_personnes),
        notes: Some(form.notes),
        entries: Some(form.entries),
        debts: Some(form.debts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report::{ChartError, ChartSpec, REPORT_FILE_NAME, Surface};

    const BUDGET_JSON: &str = r#"{
        "nombrePersonnes": 2,
        "notes": "Vacances en août",
        "entries": [
            {"section": "revenus", "category": "Salaires", "label": "Salaire Alex", "amount": 2000, "sortOrder": 0},
            {"section": "revenus", "category": "Salaires", "label": "Salaire Sam", "amount": 1800, "sortOrder": 1},
            {"section": "charges_fixes", "category": "Logement", "label": "Loyer", "amount": 900, "sortOrder": 2}
        ],
        "debts": [{"type": "Auto", "organisme": "Banque", "mensualite": 300, "sortOrder": 0}]
    }"#;

    struct Broken;

    impl Rasterizer for Broken {
        fn render(&self, _spec: &ChartSpec) -> std::result::Result<Surface, ChartError> {
            Err(ChartError::Unavailable("headless".to_string()))
        }
    }

    fn config_for(dir: &Path) -> AppConfig {
        let budget_file = dir.join("budget.json");
        std::fs::write(&budget_file, BUDGET_JSON).unwrap();
        AppConfig {
            budget_file: Some(budget_file),
            output_dir: dir.join("out"),
            settle_ms: 0,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn loads_local_budget_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(config_for(dir.path())).unwrap();
        app.load().await.unwrap();

        let dashboard = app.state.dashboard.as_ref().unwrap();
        assert_eq!(dashboard.totaux.reste_a_vivre.cents(), 260_000);

        let path = app.export().await.unwrap();
        assert_eq!(path, dir.path().join("out").join(REPORT_FILE_NAME));
        assert!(path.exists());
        assert_eq!(app.state.last_export.as_deref(), Some(path.as_path()));
        assert!(!app.state.exporting);
    }

    #[tokio::test]
    async fn second_export_is_refused_while_one_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(config_for(dir.path())).unwrap();
        app.load().await.unwrap();
        app.state.exporting = true;
        assert!(matches!(app.export().await, Err(AppError::ExportInProgress)));
    }

    #[tokio::test]
    async fn export_needs_a_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(config_for(dir.path())).unwrap();
        assert!(matches!(app.export().await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn failed_render_writes_nothing_and_clears_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::with_rasterizer(config_for(dir.path()), Broken).unwrap();
        app.load().await.unwrap();

        assert!(matches!(app.export().await, Err(AppError::Report(_))));
        assert!(!app.state.exporting);
        assert!(app.state.error.is_some());
        assert!(!dir.path().join("out").join(REPORT_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn invalid_household_in_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let budget_file = config.budget_file.clone().unwrap();
        std::fs::write(&budget_file, BUDGET_JSON.replace("\"nombrePersonnes\": 2", "\"nombrePersonnes\": 0"))
            .unwrap();

        let mut app = App::new(config).unwrap();
        assert!(matches!(app.load().await, Err(AppError::Budget(_))));
        assert!(app.state.error.is_some());
    }

    async fn spawn_api_without_dashboard() -> String {
        use axum::{Json, Router, routing::get};
        use serde_json::json;

        let app = Router::new()
            .route(
                "/budgets",
                get(|| async {
                    Json(json!({"success": true, "data": {
                        "id": 3, "userId": 1, "nombrePersonnes": 1, "notes": null,
                        "entries": [], "debts": []
                    }}))
                }),
            )
            .route(
                "/budgets/dashboard",
                get(|| async { Json(json!({"success": false, "message": "Dashboard indisponible"})) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn failed_server_dashboard_is_recorded() {
        let config = AppConfig {
            base_url: spawn_api_without_dashboard().await,
            use_server_dashboard: true,
            settle_ms: 0,
            ..AppConfig::default()
        };
        let mut app = App::new(config).unwrap();

        assert!(matches!(app.load().await, Err(AppError::Api(_))));
        assert_eq!(app.state.error.as_deref(), Some("api error: Dashboard indisponible"));
        assert!(app.state.dashboard.is_none());
    }

    #[test]
    fn patch_carries_every_field() {
        let form: BudgetForm = serde_json::from_str(BUDGET_JSON).unwrap();
        let patch = patch_from(form);
        assert_eq!(patch.nombre_personnes, Some(2));
        assert_eq!(patch.entries.map(|e| e.len()), Some(3));
    }
}
