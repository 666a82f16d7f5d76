use super::CommandError;
use hevymirror::db::RelationalMirror;

/// Prints row counts and the cursor the next sync will start from.
pub async fn show(mirror: &RelationalMirror) -> Result<(), CommandError> {
    let counts = mirror.counts().await?;

    println!("Mirror Status");
    println!("=============");
    println!();
    println!("Workouts:            {}", counts.workouts);
    println!("Exercises:           {}", counts.exercises);
    println!("Sets:                {}", counts.sets);
    println!("Exercise templates:  {}", counts.exercise_templates);
    println!("Muscle groups:       {}", counts.muscle_groups);
    println!("Secondary links:     {}", counts.secondary_muscle_groups);
    println!();

    match mirror.latest_added_on().await? {
        Some(cursor) => println!("Next sync from: {}", cursor.to_rfc3339()),
        None => println!("Next sync from: beginning of time (mirror is empty)"),
    }

    let orphans = mirror.orphan_count().await?;
    if orphans > 0 {
        println!();
        println!(
            "Warning: {} orphaned row(s). Run `bootstrap --reset` to rebuild.",
            orphans
        );
    }

    Ok(())
}
