// src/services/side_effects.rs
//
// Efeitos colaterais pós-commit (e-mail, PDF). Nunca influenciam a resposta
// HTTP; no desligamento o servidor espera as tarefas em andamento.

use std::{future::Future, time::Duration};

use tokio_util::task::TaskTracker;

#[derive(Clone, Default)]
pub struct SideEffects {
    tracker: TaskTracker,
}

impl SideEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispara a tarefa. O erro é registrado aqui e descartado.
    pub fn spawn<F, E>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        if self.tracker.is_closed() {
            tracing::warn!(label, "efeito colateral ignorado: desligamento em andamento");
            return;
        }
        self.tracker.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(label, error = %e, "⚠️ Efeito colateral falhou");
            }
        });
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Fecha o rastreador e espera as tarefas pendentes (até `grace`).
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "⏳ Aguardando efeitos colaterais pendentes...");
        }
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(pending = self.tracker.len(), "tempo esgotado; efeitos colaterais abandonados");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[tokio::test]
    async fn shutdown_drains_running_tasks() {
        let effects = SideEffects::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            effects.spawn("test", async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            });
        }

        effects.shutdown(Duration::from_secs(5)).await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(effects.pending(), 0);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let effects = SideEffects::new();
        effects.spawn("failing", async { Err::<(), _>("smtp down") });
        effects.shutdown(Duration::from_secs(1)).await;
        assert_eq!(effects.pending(), 0);
    }

    #[tokio::test]
    async fn spawning_after_shutdown_is_ignored() {
        let effects = SideEffects::new();
        effects.shutdown(Duration::from_millis(10)).await;

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        effects.spawn("late", async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
