use colored::Colorize;
use prompt_core::{FolderOption, ItemNode, Prompt, VersionRecord};

pub fn print_tree(nodes: &[ItemNode]) {
    if nodes.is_empty() {
        println!("{}", "(empty library)".dimmed());
        return;
    }
    for node in nodes {
        print_node(node, 0);
    }
}

fn print_node(node: &ItemNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        ItemNode::Folder { folder, children } => {
            println!(
                "{}{} {}",
                indent,
                format!("{}/", folder.name).blue().bold(),
                bracketed(&folder.id).dimmed()
            );
            for child in children {
                print_node(child, depth + 1);
            }
        }
        ItemNode::Prompt(prompt) => {
            let star = if prompt.is_favorite { "★ " } else { "" };
            println!(
                "{}{}{} {} {}",
                indent,
                star.yellow(),
                prompt.name,
                format!("v{}", prompt.version_number).green(),
                bracketed(&prompt.id).dimmed()
            );
        }
    }
}

pub fn print_prompt(prompt: &Prompt) {
    println!("{} {}", "Name:".bold(), prompt.name);
    println!("{} {}", "Id:".bold(), prompt.id);
    println!("{} {}", "Folder:".bold(), prompt.parent_id);
    println!("{} {}", "Version:".bold(), prompt.version_number);
    println!("{} {}", "Favorite:".bold(), prompt.is_favorite);
    println!(
        "{} {}",
        "Updated:".bold(),
        prompt.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{}", prompt.content);
}

pub fn print_versions(versions: &[VersionRecord]) {
    for (index, version) in versions.iter().enumerate() {
        let label = format!("v{}", version.version_number);
        let label = if index == 0 {
            format!("{} (current)", label).green().bold()
        } else {
            label.normal()
        };
        println!(
            "{}  {}",
            label,
            version.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
        for line in version.content.lines() {
            println!("    {}", line);
        }
    }
}

pub fn print_folder_options(options: &[FolderOption]) {
    for option in options {
        println!("{}  {}", option.label, option.id.to_string().dimmed());
    }
}

pub fn print_prompt_list(prompts: &[Prompt]) {
    if prompts.is_empty() {
        println!("{}", "No matching prompts".dimmed());
        return;
    }
    for prompt in prompts {
        let star = if prompt.is_favorite { "★ " } else { "" };
        println!(
            "{}{} {}  {}",
            star.yellow(),
            prompt.name,
            format!("v{}", prompt.version_number).green(),
            prompt.id.dimmed()
        );
    }
}

fn bracketed(id: &str) -> String {
    format!("[{}]", id)
}
