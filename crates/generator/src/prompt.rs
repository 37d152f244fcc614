//! Prompt text sent to the model.

/// Kinds of puzzle the model may pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    ShortestPath,
    CollectKeys,
    WeightedPath,
    MultipleTargets,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::ShortestPath,
        Archetype::CollectKeys,
        Archetype::WeightedPath,
        Archetype::MultipleTargets,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Archetype::ShortestPath => "shortest_path",
            Archetype::CollectKeys => "collect_keys",
            Archetype::WeightedPath => "weighted_path",
            Archetype::MultipleTargets => "multiple_targets",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Archetype::ShortestPath => "Find the shortest path between two points while avoiding walls",
            Archetype::CollectKeys => "Collect all keys (marked as 2) before reaching the exit",
            Archetype::WeightedPath => {
                "Find the path with minimum total cost (cells marked 3 cost more to cross)"
            }
            Archetype::MultipleTargets => "Visit all target points (marked as 2) in any order",
        }
    }
}

pub fn system_prompt() -> &'static str {
    "You are a JSON API that generates creative pathfinding problems. \
     Return only valid JSON without any additional text or explanation."
}

const SCHEMA: &str = r#"{
  "grid": number[][],        // 20x20 grid where: 0=path, 1=wall, 2=special (keys/targets), 3=weighted cost
  "start": [number, number], // [row, col], 0-indexed
  "end": [number, number],
  "statement": string,       // Clear problem description with specific goals
  "boilerplate": string,     // Lua starter code (see below)
  "testCases": {
    "input": {
      "grid": number[][],
      "startRow": number,
      "startCol": number,
      "endRow": number,
      "endCol": number
    },
    "output": [number, number][]  // the expected path, start to end
  }[]
}"#;

const BOILERPLATE_RULES: &str = r#"The boilerplate must be Lua defining exactly this function:

function findPath(grid, startRow, startCol, endRow, endCol, visit)
  -- grid[r + 1][c + 1] is the cell at row r, column c (Lua arrays are 1-based)
  -- call visit(r, c) for every cell you examine
  -- return a list of {r, c} pairs from start to end, or nil if there is no path
end"#;

pub fn user_prompt() -> String {
    let mut prompt = String::new();

    prompt.push_str("Generate a pathfinding problem as a JSON object. Choose randomly from these types:\n");
    for archetype in Archetype::ALL {
        prompt.push_str(&format!("- {}: {}\n", archetype.id(), archetype.description()));
    }

    prompt.push_str("\nThe response should follow this structure:\n");
    prompt.push_str(SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(BOILERPLATE_RULES);
    prompt.push_str(
        "\n\nMake the problems engaging with interesting grid layouts and clear goals. \
         Ensure all positions are valid and at least one solution exists.",
    );

    prompt
}
