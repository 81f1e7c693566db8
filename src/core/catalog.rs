//! Static portfolio content served by the catalog endpoints.

use super::models::{Project, SkillCategory};

const WEB_BASICS: &[&str] = &["HTML", "CSS", "JavaScript"];
const STORE_FEATURES: &[&str] = &["Advanced search", "Availability Filter", "Review system"];

pub static PROJECTS: [Project; 6] = [
    Project {
        id: 1,
        title: "Market Days",
        description: "A location-based web application that helps users discover local markets and preview market days in their area. Built with modern web technologies and real-time data integration.",
        tech_stack: &["HTML", "CSS", "Vanilla JS"],
        features: &[
            "Location-based search",
            "Market day previews",
            "Real-time data",
            "Mobile responsive",
        ],
        github_url: "https://github.com/Afolstee/market-days",
        demo_url: "https://market-days.vercel.app/",
        image_emoji: "🏪",
        category: "Frontend",
        view_count: 0,
    },
    Project {
        id: 2,
        title: "Trading Simulator",
        description: "A comprehensive paper trading platform with user authentication, real-time market data, and portfolio management. Enables risk-free trading education and strategy testing.",
        tech_stack: &["Next.js", "Python", "FastAPI", "WebSocket"],
        features: &[
            "User authentication",
            "Portfolio tracking",
            "Performance analytics",
            "Risk management",
        ],
        github_url: "https://github.com/Afolstee/trading-simulator",
        demo_url: "https://trading-sim-brown.vercel.app",
        image_emoji: "📈",
        category: "Full Stack",
        view_count: 0,
    },
    Project {
        id: 3,
        title: "Crypto Dashboard",
        description: "A real-time cryptocurrency tracking dashboard featuring live price updates, market news, and portfolio management. Integrates with multiple APIs for comprehensive market data.",
        tech_stack: &[
            "Next.js",
            "Python",
            "CoinGecko API",
            "CryptoCompare API",
            "WebSocket",
            "Chart.js",
            "Redis",
        ],
        features: &[
            "Live price tracking",
            "Market news",
            "Portfolio management",
            "Price alerts",
            "AI Technical analysis",
        ],
        github_url: "https://github.com/Afolstee/analyse-crypto",
        demo_url: "https://analyse-crypto-nine.vercel.app/",
        image_emoji: "₿",
        category: "Full Stack",
        view_count: 0,
    },
    Project {
        id: 4,
        title: "Book a Stay",
        description: "A modern hotel booking platform with elegant design, advanced search functionality, and seamless user experience. Features comprehensive property management and booking system.",
        tech_stack: WEB_BASICS,
        features: STORE_FEATURES,
        github_url: "https://github.com/Afolstee/book-stay",
        demo_url: "http://book-stay-99sx.vercel.app",
        image_emoji: "🏨",
        category: "Frontend",
        view_count: 0,
    },
    Project {
        id: 5,
        title: "Dakuzon",
        description: "A modern e-commerce platform with elegant design, advanced search functionality, and seamless user experience. Features comprehensive property management and booking system.",
        tech_stack: WEB_BASICS,
        features: STORE_FEATURES,
        github_url: "https://github.com/Afolstee/dakuzon",
        demo_url: "https://dakuzon.vercel.app/",
        image_emoji: "🏨",
        category: "Frontend",
        view_count: 0,
    },
    Project {
        id: 6,
        title: "Online-Shop",
        description: "A modern online shoe shopping platform with elegant design, advanced search functionality, and seamless user experience. Features comprehensive property management and booking system.",
        tech_stack: WEB_BASICS,
        features: STORE_FEATURES,
        github_url: "https://github.com/Afolstee/online-shop",
        demo_url: "https://online-shop-flame.vercel.app/",
        image_emoji: "🏨",
        category: "Frontend",
        view_count: 0,
    },
];

pub static SKILLS: [SkillCategory; 4] = [
    SkillCategory {
        name: "Frontend Development",
        technologies: &[
            "React",
            "Next.js",
            "TypeScript",
            "JavaScript",
            "HTML5",
            "CSS3",
            "Tailwind CSS",
            "Bootstrap",
        ],
        icon: "🎨",
    },
    SkillCategory {
        name: "Backend Development",
        technologies: &[
            "Python",
            "FastAPI",
            "Node.js",
            "Express.js",
            "RESTful APIs",
            "GraphQL",
            "WebSocket",
        ],
        icon: "⚙️",
    },
    SkillCategory {
        name: "Database & Storage",
        technologies: &["PostgreSQL", "MongoDB", "Redis", "SQLAlchemy", "Prisma", "Firebase"],
        icon: "🗄️",
    },
    SkillCategory {
        name: "DevOps & Tools",
        technologies: &["Git", "Docker", "AWS", "Vercel", "Railway", "Nginx", "Linux"],
        icon: "🚀",
    },
];

/// Looks up a project by its numeric id.
#[must_use]
pub fn find_project(id: u32) -> Option<&'static Project> {
    PROJECTS.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids_are_unique_and_resolvable() {
        for project in &PROJECTS {
            assert_eq!(find_project(project.id).map(|p| p.title), Some(project.title));
        }
        assert!(find_project(999).is_none());
        assert!(find_project(0).is_none());
    }
}
