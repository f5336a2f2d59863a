//! Canned scripts used when no completion service is configured.

/// Script categories offered by `GET /api/categories`.
pub const CATEGORIES: &[&str] = &[
    "combat", "farming", "fishing", "movement", "utility", "visual",
];

pub const DEFAULT_CATEGORY: &str = "utility";

const FISHING: &str = r#"-- Fishing Script
-- Description: Casts the rod, waits for a bite and reels in automatically.
-- Prompt: {prompt}

local Players = game:GetService("Players")
local player = Players.LocalPlayer

local settings = {
    castDelay = 1.5,
    reelDelay = 0.4,
    enabled = true,
}

local function getRod()
    local character = player.Character or player.CharacterAdded:Wait()
    return character:FindFirstChildWhichIsA("Tool")
end

while settings.enabled do
    local rod = getRod()
    if rod then
        rod:Activate()
        task.wait(settings.castDelay)
        rod:Activate()
        task.wait(settings.reelDelay)
    else
        task.wait(1)
    end
end
"#;

const FARMING: &str = r#"-- Auto Farm Script
-- Description: Walks between resource nodes and collects them in a loop.
-- Prompt: {prompt}

local Players = game:GetService("Players")
local player = Players.LocalPlayer

local settings = {
    radius = 150,
    collectDelay = 0.25,
    enabled = true,
}

local function nearestNode(root)
    local best, bestDistance = nil, settings.radius
    for _, node in ipairs(workspace:GetDescendants()) do
        if node:IsA("BasePart") and node:GetAttribute("Collectable") then
            local distance = (node.Position - root.Position).Magnitude
            if distance < bestDistance then
                best, bestDistance = node, distance
            end
        end
    end
    return best
end

while settings.enabled do
    local character = player.Character or player.CharacterAdded:Wait()
    local root = character:WaitForChild("HumanoidRootPart")
    local node = nearestNode(root)
    if node then
        character:WaitForChild("Humanoid"):MoveTo(node.Position)
        task.wait(settings.collectDelay)
    else
        task.wait(1)
    end
end
"#;

const COMBAT: &str = r#"-- Combat Assist Script
-- Description: Targets the closest enemy in range and attacks on a fixed cadence.
-- Prompt: {prompt}

local Players = game:GetService("Players")
local player = Players.LocalPlayer

local settings = {
    range = 25,
    attackDelay = 0.3,
    enabled = true,
}

local function closestEnemy(root)
    local best, bestDistance = nil, settings.range
    for _, other in ipairs(Players:GetPlayers()) do
        local character = other ~= player and other.Character
        local humanoid = character and character:FindFirstChild("Humanoid")
        if humanoid and humanoid.Health > 0 then
            local distance = (character.HumanoidRootPart.Position - root.Position).Magnitude
            if distance < bestDistance then
                best, bestDistance = character, distance
            end
        end
    end
    return best
end

while settings.enabled do
    local character = player.Character or player.CharacterAdded:Wait()
    local target = closestEnemy(character:WaitForChild("HumanoidRootPart"))
    local tool = character:FindFirstChildWhichIsA("Tool")
    if target and tool then
        tool:Activate()
    end
    task.wait(settings.attackDelay)
end
"#;

const CUSTOM: &str = r#"-- Custom Script
-- Description: Starter script generated from your request.
-- Prompt: {prompt}

local Players = game:GetService("Players")
local player = Players.LocalPlayer

local settings = {
    enabled = true,
    interval = 1,
}

local function step()
    -- Fill in the behaviour described in the prompt above.
    print("Running for " .. player.Name)
end

while settings.enabled do
    step()
    task.wait(settings.interval)
end
"#;

/// Key of the template actually used for `key`, normalized.
pub fn resolve_key(key: Option<&str>) -> &'static str {
    match key.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
        Some("fishing") => "fishing",
        Some("farming") => "farming",
        Some("combat") => "combat",
        _ => "custom",
    }
}

/// Fills the prompt into the template for `key`, falling back to the custom template.
pub fn render(key: Option<&str>, prompt: &str) -> String {
    let template = match resolve_key(key) {
        "fishing" => FISHING,
        "farming" => FARMING,
        "combat" => COMBAT,
        _ => CUSTOM,
    };
    // Keep the prompt on its comment line
    let prompt = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    template.replace("{prompt}", &prompt)
}

/// Category for scripts generated with template `key`.
pub fn category_for(key: Option<&str>) -> &'static str {
    let key = key.map(|k| k.trim().to_ascii_lowercase()).unwrap_or_default();
    CATEGORIES
        .iter()
        .copied()
        .find(|c| *c == key)
        .unwrap_or(DEFAULT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fishing_template_is_selected_by_key() {
        let code = render(Some("Fishing"), "catch fish");
        assert!(code.contains("Fishing Script"));
        assert!(code.contains("-- Prompt: catch fish"));
    }

    #[test]
    fn unknown_key_falls_back_to_custom() {
        assert!(render(Some("racing"), "go fast").starts_with("-- Custom Script"));
        assert!(render(None, "anything").starts_with("-- Custom Script"));
    }

    #[test]
    fn multiline_prompt_stays_in_comment() {
        let code = render(Some("combat"), "hit\nos.exit()");
        assert!(code.contains("-- Prompt: hit os.exit()"));
    }

    #[test]
    fn categories_follow_template_keys() {
        assert_eq!(category_for(Some("fishing")), "fishing");
        assert_eq!(category_for(Some("racing")), DEFAULT_CATEGORY);
        assert_eq!(category_for(None), DEFAULT_CATEGORY);
    }
}
