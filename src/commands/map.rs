use std::path::Path;

use hunter::{Places, RoomGraph, compress, find_path, load_graph, map_file_path};

fn saved_graph(dir: &Path) -> Result<RoomGraph, String> {
    load_graph(dir).map_err(|e| e.to_string())?.ok_or_else(|| {
        format!(
            "no map at {}. Run `hunter explore` first.",
            map_file_path(dir).display()
        )
    })
}

pub(super) fn run_map(dir: &Path) -> Result<(), String> {
    let graph = saved_graph(dir)?;
    println!(
        "Map: {} rooms | {} edges | {} unresolved exits | {} frontier rooms",
        graph.len(),
        graph.resolved_edge_count() / 2,
        graph.unresolved_count(),
        graph.frontier_rooms().count()
    );
    let places = Places::from_graph(&graph);
    for (place, room) in places.iter() {
        let title = graph.room(room).map(|r| r.title.as_str()).unwrap_or("?");
        println!("  {:<15} room {:>3}  {}", place.to_string(), room, title);
    }
    Ok(())
}

pub(super) fn run_path(dir: &Path, from: u32, to: u32) -> Result<(), String> {
    let graph = saved_graph(dir)?;
    for id in [from, to] {
        if !graph.contains(id) {
            return Err(format!("room {} is not on the map", id));
        }
    }
    let path =
        find_path(&graph, from, to).ok_or_else(|| format!("no route from {} to {}", from, to))?;
    if path.is_empty() {
        println!("Already there.");
        return Ok(());
    }

    let runs = compress(&path);
    println!("{} steps in {} runs:", path.len(), runs.len());
    for run in runs {
        let rooms: Vec<String> = run.rooms.iter().map(|r| r.to_string()).collect();
        println!("  {} x{} -> {}", run.direction, run.rooms.len(), rooms.join(","));
    }
    Ok(())
}
