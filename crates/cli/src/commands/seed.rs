use crate::commands::{prepare, CommandResult};
use voxdesk_db::{
    connect_with_settings, migrations, seed_demo_clients, SeedResult, SqlClientRepository,
};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlClientRepository::new(pool.clone());
        let seeded = seed_demo_clients(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", describe(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn describe(result: &SeedResult) -> String {
    let mut lines = vec![format!(
        "demo clients: {} seeded, {} already present",
        result.seeded.len(),
        result.already_present.len()
    )];
    lines.extend(result.seeded.iter().map(|slug| format!("  + {slug}")));
    lines.extend(result.already_present.iter().map(|slug| format!("  = {slug}")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use voxdesk_db::SeedResult;

    use super::describe;

    #[test]
    fn description_lists_new_and_existing_slugs() {
        let message = describe(&SeedResult {
            seeded: vec!["clinica_sonrisa".to_string()],
            already_present: vec!["bufete_gomez".to_string()],
        });

        assert_eq!(
            message,
            "demo clients: 1 seeded, 1 already present\n  + clinica_sonrisa\n  = bufete_gomez"
        );
    }

    #[test]
    fn empty_result_is_a_single_line() {
        assert_eq!(
            describe(&SeedResult::default()),
            "demo clients: 0 seeded, 0 already present"
        );
    }
}
